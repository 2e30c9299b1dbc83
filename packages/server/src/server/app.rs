//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::access::AccessControlWorkflow;
use crate::domains::agent::QuizAgentService;
use crate::domains::auth::{OtpSessionManager, SessionStore};
use crate::domains::registry::RegistryClient;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    analyze_handler, apply_status_edits_handler, cancel_handler, health_handler,
    list_registry_handler, logout_handler, request_code_handler, resend_code_handler,
    verify_code_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub otp: Arc<OtpSessionManager>,
    pub sessions: Arc<SessionStore>,
    pub access: Arc<AccessControlWorkflow>,
    pub agent: Arc<QuizAgentService>,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        let registry = Arc::new(RegistryClient::new(deps.store.clone()));
        Self {
            otp: Arc::new(OtpSessionManager::new(registry.clone(), deps.sms.clone())),
            sessions: Arc::new(SessionStore::new()),
            access: Arc::new(AccessControlWorkflow::new(
                registry.clone(),
                deps.sms.clone(),
            )),
            agent: Arc::new(QuizAgentService::new(deps.analyzer.clone(), registry)),
            deps,
        }
    }
}

/// Build the application router
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let state = AppState::new(deps);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/code", post(request_code_handler))
        .route("/auth/resend", post(resend_code_handler))
        .route("/auth/verify", post(verify_code_handler))
        .route("/auth/cancel", post(cancel_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/registry", get(list_registry_handler))
        .route("/registry/status", post(apply_status_edits_handler))
        .route("/agent/science", post(analyze_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
