use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::registry::tables::TBL_MEMBER_REQUESTS;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    registry: RegistryHealth,
}

#[derive(Serialize)]
pub struct RegistryHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Checks registry backend reachability with a bounded read.
/// Returns 200 OK when healthy, 503 Service Unavailable otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let registry_health = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.deps.store.read_all(TBL_MEMBER_REQUESTS),
    )
    .await
    {
        Ok(Ok(_)) => RegistryHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => RegistryHealth {
            status: "error".to_string(),
            error: Some(format!("Read failed: {}", e)),
        },
        Err(_) => RegistryHealth {
            status: "error".to_string(),
            error: Some("Read timeout (>5s)".to_string()),
        },
    };

    let is_healthy = registry_health.status == "ok";
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            registry: registry_health,
        }),
    )
}
