//! Configuration management for the SoulMate gateway
//!
//! Precedence: environment > TOML file > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::conversation::HistoryScope;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_COMPLETION_TIMEOUT, SamplingConfig};
use crate::voice::{DEFAULT_FALLBACK_LANGUAGE, DEFAULT_MIN_CONFIDENCE, DEFAULT_SYNTHESIS_TIMEOUT};
use crate::{Persona, Result};

use file::SoulmateConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Web page directory served when present and nothing else is configured
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active persona
    pub persona: Persona,

    /// Completion provider configuration
    pub llm: LlmConfig,

    /// Voice reply configuration
    pub voice: VoiceConfig,

    /// Conversation history policy
    pub history: HistoryConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Completion provider configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Sampling parameters sent with every request
    pub sampling: SamplingConfig,

    /// Upper bound on one completion call
    pub timeout: Duration,
}

/// Which speech provider to stream from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtsProviderKind {
    /// Tagged NDJSON chunk stream from a custom endpoint
    #[default]
    Ndjson,
    /// `OpenAI` speech API
    OpenAi,
}

impl TtsProviderKind {
    /// Parse from string representation
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open-ai" => Self::OpenAi,
            _ => Self::Ndjson,
        }
    }
}

/// Voice reply configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable spoken replies
    pub enabled: bool,

    pub provider: TtsProviderKind,

    /// Streaming endpoint (ndjson provider)
    pub endpoint: Option<String>,

    /// TTS model (openai provider)
    pub model: String,

    /// Tag used when detection is indeterminate
    pub fallback_language: String,

    /// Minimum detection confidence
    pub min_confidence: f32,

    /// Extra or overriding (language, voice) rows
    pub profiles: Vec<(String, String)>,

    /// Upper bound on one synthesis call
    pub timeout: Duration,
}

/// Conversation history policy
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryConfig {
    pub scope: HistoryScope,

    /// Keep at most this many turns per history (unbounded when `None`)
    pub max_turns: Option<usize>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web page)
    pub static_dir: Option<PathBuf>,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Groq API key (chat completions)
    pub groq: Option<String>,

    /// TTS provider key
    pub tts: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("groq", &self.groq.as_ref().map(|_| "<set>"))
            .field("tts", &self.tts.as_ref().map(|_| "<set>"))
            .finish()
    }
}

fn parse_bool(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

/// Positive whole seconds from env or file, else `default`
fn timeout_from(env_value: Option<String>, file_value: Option<u64>, default: Duration) -> Duration {
    env_value
        .and_then(|s| s.trim().parse().ok())
        .or(file_value)
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly configured persona file cannot be loaded
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly configured persona file cannot be loaded
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Merge a parsed config file with environment lookups
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly configured persona file cannot be loaded
    pub fn from_sources<F>(fc: SoulmateConfigFile, env: F, disable_voice: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Persona (env > toml > embedded)
        let persona_path = env("SOULMATE_PERSONA_FILE")
            .or(fc.persona)
            .map(PathBuf::from);
        let persona = Persona::load_or_default(persona_path.as_deref())?;

        // API keys (env > toml > None); empty values count as missing
        let api_keys = ApiKeys {
            groq: env("GROQ_API_KEY")
                .or(fc.api_keys.groq)
                .filter(|k| !k.trim().is_empty()),
            tts: env("SOULMATE_TTS_API_KEY")
                .or_else(|| env("OPENAI_API_KEY"))
                .or(fc.api_keys.tts)
                .filter(|k| !k.trim().is_empty()),
        };

        // LLM config (env > toml > default)
        let defaults = SamplingConfig::default();
        let llm = LlmConfig {
            base_url: env("SOULMATE_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            sampling: SamplingConfig {
                model: env("SOULMATE_LLM_MODEL")
                    .or(fc.llm.model)
                    .unwrap_or(defaults.model),
                temperature: fc.llm.temperature.unwrap_or(defaults.temperature),
                max_tokens: fc.llm.max_tokens.unwrap_or(defaults.max_tokens),
                top_p: fc.llm.top_p.unwrap_or(defaults.top_p),
            },
            timeout: timeout_from(
                env("SOULMATE_LLM_TIMEOUT_SECS"),
                fc.llm.timeout_secs,
                DEFAULT_COMPLETION_TIMEOUT,
            ),
        };

        // Voice config (flag > env > toml > default)
        let voice_enabled = !disable_voice
            && !env("SOULMATE_DISABLE_VOICE").is_some_and(|v| parse_bool(&v))
            && fc.voice.enabled.unwrap_or(true);
        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }
        let voice = VoiceConfig {
            enabled: voice_enabled,
            provider: env("SOULMATE_TTS_PROVIDER")
                .or(fc.voice.provider)
                .map(|s| TtsProviderKind::from_str(&s))
                .unwrap_or_default(),
            endpoint: env("SOULMATE_TTS_ENDPOINT").or(fc.voice.endpoint),
            model: env("SOULMATE_TTS_MODEL")
                .or(fc.voice.model)
                .unwrap_or_else(|| "tts-1".to_string()),
            fallback_language: fc
                .voice
                .fallback_language
                .unwrap_or_else(|| DEFAULT_FALLBACK_LANGUAGE.to_string()),
            min_confidence: fc
                .voice
                .min_confidence
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_MIN_CONFIDENCE)
                .clamp(0.0, 1.0),
            profiles: fc
                .voice
                .profiles
                .into_iter()
                .map(|p| (p.language, p.voice))
                .collect(),
            timeout: timeout_from(
                env("SOULMATE_TTS_TIMEOUT_SECS"),
                fc.voice.timeout_secs,
                DEFAULT_SYNTHESIS_TIMEOUT,
            ),
        };

        // History policy (env > toml > default)
        let history = HistoryConfig {
            scope: env("SOULMATE_HISTORY_SCOPE")
                .or(fc.history.scope)
                .map(|s| HistoryScope::from_str(&s))
                .unwrap_or_default(),
            max_turns: env("SOULMATE_HISTORY_MAX_TURNS")
                .and_then(|s| s.parse().ok())
                .or(fc.history.max_turns)
                .filter(|n| *n > 0),
        };

        // Server config (env > toml > default)
        let server = ServerConfig {
            port: env("SOULMATE_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("SOULMATE_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from)
                .or_else(|| {
                    let dir = PathBuf::from(DEFAULT_STATIC_DIR);
                    dir.is_dir().then_some(dir)
                }),
        };

        Ok(Self {
            persona,
            llm,
            voice,
            history,
            server,
            api_keys,
        })
    }
}
