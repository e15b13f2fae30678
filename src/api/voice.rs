//! Voice table endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::voice::VoiceProfile;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/voices", get(voices))
        .with_state(state)
}

/// Language to voice table
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    /// Voice used for unrecognized languages
    pub default: VoiceProfile,
    pub profiles: Vec<VoiceProfile>,
    pub synthesis_available: bool,
}

async fn voices(State(state): State<Arc<ApiState>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        default: state.voices.default_profile().clone(),
        profiles: state.voices.profiles().cloned().collect(),
        synthesis_available: state.chat.voice().is_some(),
    })
}
