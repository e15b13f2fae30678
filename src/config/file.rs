//! TOML configuration file loading
//!
//! Supports `~/.config/soulmate/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SoulmateConfigFile {
    /// Path to a persona JSON file
    #[serde(default)]
    pub persona: Option<String>,

    /// Completion provider configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice reply configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Conversation history policy
    #[serde(default)]
    pub history: HistoryFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Completion provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible base URL
    pub base_url: Option<String>,

    /// Model identifier (e.g. "llama-3.3-70b-versatile")
    pub model: Option<String>,

    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,

    /// Completion call timeout
    pub timeout_secs: Option<u64>,
}

/// Voice reply configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable spoken replies
    pub enabled: Option<bool>,

    /// "ndjson" or "openai"
    pub provider: Option<String>,

    /// Streaming endpoint for the ndjson provider
    pub endpoint: Option<String>,

    /// TTS model (openai provider)
    pub model: Option<String>,

    /// Tag used when detection is indeterminate
    pub fallback_language: Option<String>,

    /// Minimum detection confidence
    pub min_confidence: Option<f32>,

    /// Extra or overriding table rows
    #[serde(default)]
    pub profiles: Vec<VoiceProfileFileConfig>,

    /// Synthesis call timeout
    pub timeout_secs: Option<u64>,
}

/// One language to voice table row
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceProfileFileConfig {
    pub language: String,
    pub voice: String,
}

/// Conversation history configuration
#[derive(Debug, Default, Deserialize)]
pub struct HistoryFileConfig {
    /// "shared" or "session"
    pub scope: Option<String>,

    /// Keep at most this many turns per history
    pub max_turns: Option<usize>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,

    /// Directory with the web page
    pub static_dir: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub tts: Option<String>,
}

/// Load the TOML config file from `SOULMATE_CONFIG` or the standard path
///
/// Returns `SoulmateConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SoulmateConfigFile {
    let path = std::env::var("SOULMATE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(config_file_path);

    path.map_or_else(SoulmateConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a TOML config file from an explicit path
pub fn load_config_file_from(path: &Path) -> SoulmateConfigFile {
    if !path.exists() {
        return SoulmateConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SoulmateConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SoulmateConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/soulmate/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("soulmate").join("config.toml"))
}
