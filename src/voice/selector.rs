//! Language to voice mapping

use std::collections::BTreeMap;

use serde::Serialize;

/// A (language, synthesis voice) pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceProfile {
    /// Primary language subtag this voice speaks (e.g. "en")
    pub language: String,

    /// Provider voice identifier
    pub voice_id: String,
}

impl VoiceProfile {
    #[must_use]
    pub fn new(language: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            voice_id: voice_id.into(),
        }
    }
}

/// Built-in table: (language, voice)
const DEFAULT_PROFILES: &[(&str, &str)] = &[
    ("en", "en-US-AriaNeural"),
    ("ja", "ja-JP-NanamiNeural"),
    ("ko", "ko-KR-SunHiNeural"),
    ("zh", "zh-TW-HsiaoChenNeural"),
];

/// Language of the profile used for unrecognized tags
const DEFAULT_LANGUAGE: &str = "zh";

/// Reduce a tag like "en-US" or "zh_Hant" to its lowercase primary subtag
fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Total, deterministic mapping from language tag to voice profile
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    profiles: BTreeMap<String, VoiceProfile>,
    default: VoiceProfile,
}

impl VoiceSelector {
    /// Create a selector with only a default profile
    #[must_use]
    pub fn new(default: VoiceProfile) -> Self {
        Self {
            profiles: BTreeMap::new(),
            default,
        }
    }

    /// Add or replace the profile for a language
    #[must_use]
    pub fn with_profile(mut self, language: &str, voice_id: impl Into<String>) -> Self {
        let language = primary_subtag(language);
        let profile = VoiceProfile::new(language.clone(), voice_id);
        if self.default.language == language {
            self.default = profile.clone();
        }
        self.profiles.insert(language, profile);
        self
    }

    /// Built-in table with extra or overriding (language, voice) rows
    #[must_use]
    pub fn with_overrides(rows: &[(String, String)]) -> Self {
        rows.iter()
            .fold(Self::default(), |selector, (language, voice)| {
                selector.with_profile(language, voice.as_str())
            })
    }

    /// Select the voice for a language tag; unknown tags get the default
    #[must_use]
    pub fn select(&self, language: &str) -> &VoiceProfile {
        self.profiles
            .get(&primary_subtag(language))
            .unwrap_or(&self.default)
    }

    /// Profile used for unrecognized tags
    #[must_use]
    pub const fn default_profile(&self) -> &VoiceProfile {
        &self.default
    }

    /// All explicit table rows, ordered by language
    pub fn profiles(&self) -> impl Iterator<Item = &VoiceProfile> {
        self.profiles.values()
    }
}

impl Default for VoiceSelector {
    fn default() -> Self {
        let default = VoiceProfile::new(DEFAULT_LANGUAGE, "zh-TW-HsiaoChenNeural");
        DEFAULT_PROFILES
            .iter()
            .fold(Self::new(default), |selector, (language, voice)| {
                selector.with_profile(language, *voice)
            })
    }
}
