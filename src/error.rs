//! Error types for the SoulMate gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or missing user message
    #[error("input error: message is empty")]
    Input,

    /// Completion provider failed or is not configured
    #[error("provider error: {0}")]
    Provider(String),

    /// Voice synthesis failed
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona file could not be loaded
    #[error("persona error: {0}")]
    Persona(String),

    /// Socket or file IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
