//! Admin registry routes: list entries, apply status edits.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::{error_response, require_admin, ErrorResponse};
use crate::domains::access::{AccessError, CommitOutcome, StatusEdit};
use crate::domains::registry::{RegistryEntry, RegistryStatus};
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    /// Optional status filter, as a wire label (활성/대기/비활성)
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ApplyEditsRequest {
    pub edits: Vec<StatusEdit>,
}

fn access_error(err: AccessError) -> ErrorResponse {
    match err {
        AccessError::InvalidStatusValue(value) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_status_value",
            &format!(
                "권한 상태 컬럼에는 '활성', '대기', '비활성' 중 하나만 입력 가능합니다. (입력값: {})",
                value
            ),
        ),
        AccessError::Registry(e) => {
            tracing::error!(error = %e, "Registry unavailable");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "registry_unavailable",
                "등록 정보를 확인할 수 없습니다. 잠시 후 다시 시도해주세요.",
            )
        }
    }
}

pub async fn list_registry_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RegistryEntry>>, ErrorResponse> {
    require_admin(&state, &headers).await?;

    let filter = match params.status.as_deref() {
        None | Some("전체") => None,
        Some(label) => Some(RegistryStatus::parse(label).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "invalid_status_value",
                &format!("알 수 없는 필터 값입니다: {}", label),
            )
        })?),
    };

    let entries = state
        .access
        .list_entries(filter)
        .await
        .map_err(access_error)?;
    Ok(Json(entries))
}

pub async fn apply_status_edits_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ApplyEditsRequest>,
) -> Result<Json<CommitOutcome>, ErrorResponse> {
    let admin = require_admin(&state, &headers).await?;

    // The snapshot the diff runs against is loaded server-side so stale
    // client copies cannot resurrect rows
    let original = state.access.list_entries(None).await.map_err(access_error)?;

    let outcome = state
        .access
        .commit(&admin, &original, &request.edits)
        .await
        .map_err(access_error)?;
    Ok(Json(outcome))
}
