//! SoulMate Gateway - conversational companion backend with voice replies
//!
//! This library provides the core of the SoulMate companion:
//! - Multi-turn chat with an in-memory conversation history
//! - Reply generation through a hosted chat-completion API
//! - Language detection of replies and matching voice selection
//! - Streaming speech synthesis aggregated into one audio payload
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              HTTP API  /  CLI                       │
//! └────────────────────┬────────────────────────────────┘
//!                      │ submit_message
//! ┌────────────────────▼────────────────────────────────┐
//! │                ChatOrchestrator                     │
//! │  SessionStore │ ReplyGenerator │ VoicePipeline      │
//! └────────┬──────────────┬─────────────────┬───────────┘
//!          │              │                 │
//!    history (mutex)  completion API   detect → select → TTS stream
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod persona;
pub mod voice;

pub use chat::{ChatOrchestrator, ChatOutcome, ChatResult, SynthesisResult};
pub use config::Config;
pub use conversation::{ConversationHistory, HistoryScope, Role, SessionStore, Turn};
pub use error::{Error, Result};
pub use llm::{CompletionProvider, CompletionRequest, GroqClient, ReplyGenerator, SamplingConfig};
pub use persona::Persona;
pub use voice::{
    LanguageDetector, SpeechChunk, SpeechProvider, SpeechSynthesizer, VoicePipeline,
    VoiceProfile, VoiceSelector,
};
