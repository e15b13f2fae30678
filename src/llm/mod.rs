//! Reply generation through a hosted chat-completion API

mod groq;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use groq::{DEFAULT_BASE_URL, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MODEL, GroqClient};

use crate::conversation::{Role, Turn};
use crate::{Config, Error, Result};

/// One message in a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self::new(turn.role(), turn.content())
    }
}

/// Fixed sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Model identifier
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

/// A complete, non-streaming completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub sampling: SamplingConfig,
}

/// A chat-completion backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the request and return the text of the first choice
    ///
    /// # Errors
    ///
    /// Returns error on network, auth, or response-shape failures
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Composes persona and history into requests and returns the model's reply
///
/// Never touches history; recording turns is the orchestrator's job.
#[derive(Clone)]
pub struct ReplyGenerator {
    provider: Option<Arc<dyn CompletionProvider>>,
    system_prompt: String,
    sampling: SamplingConfig,
}

impl ReplyGenerator {
    /// Create a generator; `None` leaves it in the disabled state
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn CompletionProvider>>,
        system_prompt: impl Into<String>,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            sampling,
        }
    }

    /// Build a generator from configuration
    ///
    /// A missing or unusable API key is logged once here; the generator is
    /// left disabled and every later call fails with `Error::Provider`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let llm = &config.llm;
        let provider = match config.api_keys.groq.clone() {
            Some(key) => match GroqClient::with_timeout(key, llm.base_url.clone(), llm.timeout) {
                Ok(client) => {
                    tracing::info!(
                        model = %llm.sampling.model,
                        timeout_secs = llm.timeout.as_secs(),
                        "completion provider configured"
                    );
                    Some(Arc::new(client) as Arc<dyn CompletionProvider>)
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to create completion client, chat disabled");
                    None
                }
            },
            None => {
                tracing::error!(
                    error = %Error::Config("GROQ_API_KEY not set".to_string()),
                    "chat disabled, replies will be degraded"
                );
                None
            }
        };

        Self::new(
            provider,
            config.persona.system_prompt.as_str(),
            config.llm.sampling.clone(),
        )
    }

    /// Whether a completion provider is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    #[must_use]
    pub const fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Build the ordered request: persona, then history, then the new input
    #[must_use]
    pub fn compose(&self, history: &[Turn], user_input: &str) -> CompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(Role::System, self.system_prompt.as_str()));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::new(Role::User, user_input));

        CompletionRequest {
            messages,
            sampling: self.sampling.clone(),
        }
    }

    /// Generate a reply to `user_input` given the prior `history`
    ///
    /// # Errors
    ///
    /// Returns `Error::Provider` if no provider is configured or the call fails
    pub async fn generate(&self, history: &[Turn], user_input: &str) -> Result<String> {
        let Some(provider) = &self.provider else {
            return Err(Error::Provider(
                "completion provider not configured (missing API key)".to_string(),
            ));
        };

        let request = self.compose(history, user_input);
        tracing::debug!(
            messages = request.messages.len(),
            model = %request.sampling.model,
            "requesting completion"
        );

        provider.complete(&request).await.map_err(|e| match e {
            Error::Provider(_) => e,
            other => Error::Provider(other.to_string()),
        })
    }
}

impl std::fmt::Debug for ReplyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyGenerator")
            .field("enabled", &self.is_enabled())
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}
