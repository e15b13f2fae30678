//! Health check endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub persona_id: String,
    pub persona: String,
    /// Completion provider configured
    pub chat_available: bool,
    /// Speech provider configured
    pub voice_available: bool,
}

/// Liveness check; reports "degraded" when chat is disabled
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let chat_available = state.chat.generator().is_enabled();

    Json(HealthResponse {
        status: if chat_available { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        persona_id: state.persona_id.clone(),
        persona: state.persona_name.clone(),
        chat_available,
        voice_available: state.chat.voice().is_some(),
    })
}

/// Build health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
