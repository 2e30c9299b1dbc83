// HTTP routes
pub mod agent;
pub mod auth;
pub mod health;
pub mod registry;

pub use agent::*;
pub use auth::*;
pub use health::*;
pub use registry::*;

use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::domains::auth::{AuthError, DenialReason, Principal};
use crate::server::app::AppState;

/// JSON error body returned by every route
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn error_response(status: StatusCode, error: &'static str, message: &str) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            error,
            message: message.to_string(),
        }),
    )
}

/// Map auth-domain errors onto HTTP responses with user-facing messages
pub fn auth_error(err: AuthError) -> ErrorResponse {
    match err {
        AuthError::NotAuthorized(DenialReason::Waiting) => error_response(
            StatusCode::FORBIDDEN,
            "waiting",
            "관리자가 권한 요청을 검토 중입니다.",
        ),
        AuthError::NotAuthorized(DenialReason::Inactive) => error_response(
            StatusCode::FORBIDDEN,
            "inactive",
            "권한이 비활성 상태입니다. 관리자에게 문의하세요.",
        ),
        AuthError::NotAuthorized(DenialReason::NotFound) => error_response(
            StatusCode::FORBIDDEN,
            "not_found",
            "등록되지 않은 번호입니다. 관리자에게 권한을 요청하세요.",
        ),
        AuthError::DeliveryFailed => error_response(
            StatusCode::BAD_GATEWAY,
            "delivery_failed",
            "SMS 발송에 실패했습니다.",
        ),
        AuthError::Expired => error_response(
            StatusCode::UNAUTHORIZED,
            "expired",
            "인증번호 유효시간이 만료되었습니다. 인증번호를 재발송해주세요.",
        ),
        AuthError::Mismatched => error_response(
            StatusCode::UNAUTHORIZED,
            "mismatched",
            "인증번호가 일치하지 않습니다.",
        ),
        AuthError::NoSession => error_response(
            StatusCode::UNAUTHORIZED,
            "no_session",
            "진행 중인 인증이 없습니다.",
        ),
        AuthError::Registry(e) => {
            tracing::error!(error = %e, "Registry unavailable");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "registry_unavailable",
                "등록 정보를 확인할 수 없습니다. 잠시 후 다시 시도해주세요.",
            )
        }
    }
}

/// Extract the bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's session, any role
pub async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, ErrorResponse> {
    let token = bearer_token(headers).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "unauthenticated", "로그인이 필요합니다.")
    })?;
    let session = state.sessions.get_session(token).await.ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "unauthenticated", "로그인이 필요합니다.")
    })?;
    Ok(session.principal)
}

/// Resolve the caller's session and require the administrator role
pub async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, ErrorResponse> {
    let principal = require_session(state, headers).await?;
    if !principal.is_admin() {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "admin_required",
            "관리자 권한이 필요합니다.",
        ));
    }
    Ok(principal)
}
