//! Login flow routes: request / resend / verify / cancel / logout.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{auth_error, ErrorResponse};
use crate::domains::registry::AccessRole;
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct PhoneRequest {
    pub phone_number: String,
    /// Admin-mode toggle: the caller chooses the role it is logging in as;
    /// the registry still gates by (phone, requested role)
    #[serde(default)]
    pub admin: bool,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub phone_number: String,
    #[serde(default)]
    pub admin: bool,
    pub code: String,
}

#[derive(Serialize)]
pub struct SentResponse {
    pub sent: bool,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub phone_number: String,
    pub admin: bool,
}

pub async fn request_code_handler(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<SentResponse>, ErrorResponse> {
    let role = AccessRole::from_admin_flag(request.admin);
    state
        .otp
        .issue_code(&request.phone_number, role)
        .await
        .map_err(auth_error)?;
    Ok(Json(SentResponse { sent: true }))
}

pub async fn resend_code_handler(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<SentResponse>, ErrorResponse> {
    let role = AccessRole::from_admin_flag(request.admin);
    state
        .otp
        .resend_code(&request.phone_number, role)
        .await
        .map_err(auth_error)?;
    Ok(Json(SentResponse { sent: true }))
}

pub async fn verify_code_handler(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ErrorResponse> {
    let role = AccessRole::from_admin_flag(request.admin);
    let principal = state
        .otp
        .verify_code(&request.phone_number, role, &request.code)
        .await
        .map_err(auth_error)?;

    let token = state.sessions.create_session(principal.clone()).await;
    Ok(Json(VerifyResponse {
        token,
        admin: principal.is_admin(),
        phone_number: principal.phone_number,
    }))
}

pub async fn cancel_handler(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> StatusCode {
    let role = AccessRole::from_admin_flag(request.admin);
    state.otp.cancel(&request.phone_number, role).await;
    StatusCode::NO_CONTENT
}

pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.sessions.delete_session(token).await;
    }
    StatusCode::NO_CONTENT
}
