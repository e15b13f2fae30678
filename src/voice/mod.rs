//! Language-adaptive voice replies
//!
//! Detects the language of a reply, picks a matching voice, and synthesizes
//! it through a streaming TTS provider.

mod language;
mod providers;
mod selector;
mod tts;

pub use language::{
    DEFAULT_FALLBACK_LANGUAGE, DEFAULT_MIN_CONFIDENCE, Detection, LanguageDetector,
    LanguageIdentifier, WhatlangIdentifier,
};
pub use providers::{
    DEFAULT_SYNTHESIS_TIMEOUT, NdjsonSpeechProvider, OPENAI_SPEECH_URL, OpenAiSpeechProvider,
};
pub use selector::{VoiceProfile, VoiceSelector};
pub use tts::{
    ChunkKind, ChunkStream, SpeechChunk, SpeechProvider, SpeechSynthesizer, collect_audio,
};

use std::sync::Arc;

use crate::Result;
use crate::config::{ApiKeys, TtsProviderKind, VoiceConfig};

/// Synthesized speech for one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenReply {
    /// Tag the detector settled on
    pub language: String,

    /// Voice that spoke the reply
    pub voice: VoiceProfile,

    /// Raw audio (MP3)
    pub audio: Vec<u8>,
}

/// Detector, selector, and synthesizer run in sequence
#[derive(Debug, Clone)]
pub struct VoicePipeline {
    detector: LanguageDetector,
    selector: VoiceSelector,
    synthesizer: SpeechSynthesizer,
}

impl VoicePipeline {
    #[must_use]
    pub const fn new(
        detector: LanguageDetector,
        selector: VoiceSelector,
        synthesizer: SpeechSynthesizer,
    ) -> Self {
        Self {
            detector,
            selector,
            synthesizer,
        }
    }

    /// Build the pipeline from configuration
    ///
    /// Returns `None` (text-only replies) when voice is disabled or the
    /// configured provider is missing its endpoint or key.
    #[must_use]
    pub fn from_config(config: &VoiceConfig, keys: &ApiKeys) -> Option<Self> {
        if !config.enabled {
            tracing::info!("voice replies disabled");
            return None;
        }

        let provider: Arc<dyn SpeechProvider> = match config.provider {
            TtsProviderKind::Ndjson => {
                let Some(endpoint) = config.endpoint.clone() else {
                    tracing::warn!("no TTS endpoint configured, voice replies disabled");
                    return None;
                };
                match NdjsonSpeechProvider::new(endpoint, keys.tts.clone())
                    .and_then(|p| p.with_timeout(config.timeout))
                {
                    Ok(p) => Arc::new(p),
                    Err(e) => {
                        tracing::warn!(error = %e, "voice replies disabled");
                        return None;
                    }
                }
            }
            TtsProviderKind::OpenAi => {
                let key = keys.tts.clone().unwrap_or_default();
                match OpenAiSpeechProvider::new(key, config.model.clone())
                    .and_then(|p| p.with_timeout(config.timeout))
                {
                    Ok(p) => Arc::new(p),
                    Err(e) => {
                        tracing::warn!(error = %e, "voice replies disabled");
                        return None;
                    }
                }
            }
        };

        let selector = VoiceSelector::with_overrides(&config.profiles);
        let detector = LanguageDetector::new(
            Arc::new(WhatlangIdentifier),
            config.fallback_language.as_str(),
            config.min_confidence,
        );

        tracing::info!(provider = ?config.provider, "voice replies enabled");
        Some(Self::new(detector, selector, SpeechSynthesizer::new(provider)))
    }

    #[must_use]
    pub const fn selector(&self) -> &VoiceSelector {
        &self.selector
    }

    #[must_use]
    pub const fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Speak `text` in the voice matching its detected language
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if synthesis fails; detection never fails
    pub async fn speak(&self, text: &str) -> Result<SpokenReply> {
        let language = self.detector.detect(text);
        self.speak_as(text, &language).await
    }

    /// Speak `text` with the voice for an explicit language tag
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if synthesis fails
    pub async fn speak_as(&self, text: &str, language: &str) -> Result<SpokenReply> {
        let voice = self.selector.select(language).clone();
        tracing::debug!(language, voice = %voice.voice_id, "selected voice");

        let audio = self.synthesizer.synthesize(text, &voice).await?;

        Ok(SpokenReply {
            language: language.to_string(),
            voice,
            audio,
        })
    }
}
