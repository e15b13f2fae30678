//! Per-request chat orchestration
//!
//! Sequence for every message: validate, record the user turn, generate,
//! record the reply, optionally speak it, return. Every failure ends in a
//! well-formed [`ChatResult`]; nothing propagates to the transport layer.

use base64::Engine;
use serde::Serialize;

use crate::conversation::{SessionStore, Turn};
use crate::llm::ReplyGenerator;
use crate::persona::{Persona, PersonaReplies};
use crate::voice::{SpokenReply, VoicePipeline};
use crate::{Config, Error, Result};

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOutcome {
    /// The model replied
    Replied,
    /// The message was empty; nothing was recorded
    EmptyInput,
    /// The completion provider failed; an apology was returned
    Degraded,
}

/// Synthesized audio attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    /// Raw audio bytes (MP3)
    pub audio_bytes: Vec<u8>,

    /// Language tag the voice was chosen for
    pub language: String,

    /// Voice that spoke the reply
    pub voice_id: String,
}

impl SynthesisResult {
    /// Transport encoding of [`Self::encoded`]
    pub const ENCODING: &'static str = "base64";

    /// Audio encoded for transport
    #[must_use]
    pub fn encoded(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.audio_bytes)
    }
}

impl From<SpokenReply> for SynthesisResult {
    fn from(spoken: SpokenReply) -> Self {
        Self {
            audio_bytes: spoken.audio,
            language: spoken.language,
            voice_id: spoken.voice.voice_id,
        }
    }
}

/// Result of one submitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResult {
    /// Model reply, or a canned user-facing message
    pub reply_text: String,

    /// Audio for the reply, absent when skipped or failed
    pub synthesis: Option<SynthesisResult>,

    pub outcome: ChatOutcome,
}

/// Drives history, generation, and voice for each request
#[derive(Debug, Clone)]
pub struct ChatOrchestrator {
    generator: ReplyGenerator,
    voice: Option<VoicePipeline>,
    sessions: SessionStore,
    replies: PersonaReplies,
}

impl ChatOrchestrator {
    #[must_use]
    pub fn new(persona: &Persona, generator: ReplyGenerator, sessions: SessionStore) -> Self {
        Self {
            generator,
            voice: None,
            sessions,
            replies: persona.replies.clone(),
        }
    }

    /// Build the orchestrator and its collaborators from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let generator = ReplyGenerator::from_config(config);
        let sessions = SessionStore::new(config.history.scope, config.history.max_turns);
        let chat = Self::new(&config.persona, generator, sessions);

        match VoicePipeline::from_config(&config.voice, &config.api_keys) {
            Some(pipeline) => chat.with_voice(pipeline),
            None => chat,
        }
    }

    /// Enable spoken replies
    #[must_use]
    pub fn with_voice(mut self, pipeline: VoicePipeline) -> Self {
        self.voice = Some(pipeline);
        self
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub const fn voice(&self) -> Option<&VoicePipeline> {
        self.voice.as_ref()
    }

    #[must_use]
    pub const fn generator(&self) -> &ReplyGenerator {
        &self.generator
    }

    /// Submit a message to the default conversation
    pub async fn submit_message(&self, text: &str) -> ChatResult {
        self.submit_message_in(None, text).await
    }

    /// Submit a message to a session's conversation
    ///
    /// `session_id` only matters when histories are per-session.
    pub async fn submit_message_in(&self, session_id: Option<&str>, text: &str) -> ChatResult {
        match self.converse(session_id, text).await {
            Ok(reply) => {
                let synthesis = self.speak(&reply).await;
                ChatResult {
                    reply_text: reply,
                    synthesis,
                    outcome: ChatOutcome::Replied,
                }
            }
            Err(Error::Input) => {
                tracing::debug!("empty message, prompting for input");
                ChatResult {
                    reply_text: self.replies.empty_input.clone(),
                    synthesis: None,
                    outcome: ChatOutcome::EmptyInput,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "reply generation failed, returning degraded reply");
                ChatResult {
                    reply_text: self.replies.degraded.clone(),
                    synthesis: None,
                    outcome: ChatOutcome::Degraded,
                }
            }
        }
    }

    /// Record the user turn, generate, and record the reply
    ///
    /// The session's history stays locked for the whole exchange. On a
    /// generation failure the user turn stays recorded without a reply.
    async fn converse(&self, session_id: Option<&str>, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::Input);
        }

        let shared = self.sessions.history(session_id).await;
        let mut history = shared.lock().await;

        let prior = history.turns().to_vec();
        history.push(Turn::user(text));
        tracing::info!(turns = prior.len(), "generating reply");

        let reply = self.generator.generate(&prior, text).await?;
        history.push(Turn::assistant(reply.as_str()));
        tracing::debug!(reply = %reply, "reply recorded");

        Ok(reply)
    }

    /// Speak a reply when voice is enabled; failures drop the audio only
    async fn speak(&self, reply: &str) -> Option<SynthesisResult> {
        let pipeline = self.voice.as_ref()?;
        if reply.trim().is_empty() {
            return None;
        }

        match pipeline.speak(reply).await {
            Ok(spoken) => Some(spoken.into()),
            Err(e) => {
                tracing::warn!(error = %e, "voice synthesis failed, replying with text only");
                None
            }
        }
    }
}
