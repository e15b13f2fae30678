//! Persona configuration
//!
//! A persona is the fixed system-level instruction text that shapes the
//! assistant, plus the canned replies used when no model output is available.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Built-in persona shipped with the binary
const EMBEDDED_SOULMATE: &str = include_str!("../personas/soulmate.json");

/// Identity and behavior of the assistant
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// System prompt prepended to every completion request
    pub system_prompt: String,

    /// User-facing canned replies
    #[serde(default)]
    pub replies: PersonaReplies,
}

/// Replies returned instead of model output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaReplies {
    /// Prompt shown when the user sends an empty message
    pub empty_input: String,

    /// Apology shown when the completion provider is unavailable
    pub degraded: String,
}

impl Default for PersonaReplies {
    fn default() -> Self {
        Self {
            empty_input: "Please type a message.".to_string(),
            degraded: "I'm having trouble connecting right now. Please try again later."
                .to_string(),
        }
    }
}

impl Persona {
    /// The embedded "soulmate" persona
    ///
    /// # Panics
    ///
    /// Never in practice: the embedded JSON is covered by tests.
    #[must_use]
    pub fn soulmate() -> Self {
        Self::from_json(EMBEDDED_SOULMATE).expect("embedded persona is valid")
    }

    /// Parse a persona from JSON text
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the system prompt is blank
    pub fn from_json(json: &str) -> Result<Self> {
        let persona: Self = serde_json::from_str(json)
            .map_err(|e| Error::Persona(format!("invalid persona JSON: {e}")))?;

        if persona.system_prompt.trim().is_empty() {
            return Err(Error::Persona(format!(
                "persona '{}' has an empty system prompt",
                persona.id
            )));
        }

        Ok(persona)
    }

    /// Load a persona from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Persona(format!("failed to read {}: {e}", path.display()))
        })?;
        let persona = Self::from_json(&content)?;
        tracing::info!(persona = %persona.id, path = %path.display(), "loaded persona file");
        Ok(persona)
    }

    /// Load from `path` when given, otherwise use the embedded persona
    ///
    /// # Errors
    ///
    /// Returns error if an explicit path is given but cannot be loaded
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::soulmate()), Self::load)
    }
}
