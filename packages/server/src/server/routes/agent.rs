//! Quiz analyzer pass-through route.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use base64::Engine as _;
use serde::Deserialize;

use super::{error_response, require_session, ErrorResponse};
use crate::kernel::QuizAnalysis;
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub image_base64: String,
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<QuizAnalysis>, ErrorResponse> {
    let principal = require_session(&state, &headers).await?;

    let image = base64::engine::general_purpose::STANDARD
        .decode(&request.image_base64)
        .map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                "invalid_image",
                "이미지를 해석할 수 없습니다.",
            )
        })?;

    let analysis = state
        .agent
        .analyze(&principal, &image)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Quiz analysis failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "analysis_failed",
                "문제 분석 중 오류가 발생했습니다. 다시 시도해주세요.",
            )
        })?;

    Ok(Json(analysis))
}
