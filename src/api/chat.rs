//! Chat endpoints
//!
//! Every chat request answers 200 with a well-formed body, including empty
//! input and provider failures.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::chat::{ChatOutcome, ChatResult};
use crate::conversation::Turn;

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/history", get(history).delete(clear_history))
        .with_state(state)
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,

    /// Conversation to continue (per-session histories only)
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Reply text or canned message
    pub response: String,

    /// Base64 MP3 audio, `null` when not synthesized
    pub audio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    pub outcome: ChatOutcome,
}

impl From<ChatResult> for ChatResponse {
    fn from(result: ChatResult) -> Self {
        let (audio, language, voice) = result.synthesis.map_or((None, None, None), |s| {
            (Some(s.encoded()), Some(s.language), Some(s.voice_id))
        });

        Self {
            response: result.reply_text,
            audio,
            language,
            voice,
            outcome: result.outcome,
        }
    }
}

/// Submit a message and get the reply
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let message = request.message.unwrap_or_default();
    let result = state
        .chat
        .submit_message_in(request.session_id.as_deref(), &message)
        .await;

    Json(result.into())
}

/// Session selector for history endpoints
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// History listing
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
}

/// List the turns of a conversation
async fn history(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SessionQuery>,
) -> Json<HistoryResponse> {
    let turns = state
        .chat
        .sessions()
        .snapshot(query.session_id.as_deref())
        .await;
    Json(HistoryResponse { turns })
}

/// Clear result
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// Forget a conversation
async fn clear_history(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SessionQuery>,
) -> Json<ClearResponse> {
    let cleared = state.chat.sessions().clear(query.session_id.as_deref()).await;
    tracing::info!(cleared, "conversation history cleared");
    Json(ClearResponse { cleared })
}
