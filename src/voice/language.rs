//! Best-effort language detection for generated replies
//!
//! Detection never fails outward: an unknown or low-confidence result turns
//! into the configured fallback tag.

use std::sync::Arc;

use whatlang::Lang;

/// Tag used when detection is indeterminate
pub const DEFAULT_FALLBACK_LANGUAGE: &str = "zh-TW";

/// Minimum share of letters in the dominant script
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// A raw identification result
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO-like language tag (e.g. "en", "ja")
    pub language: String,

    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
}

/// Statistical or heuristic language identification
pub trait LanguageIdentifier: Send + Sync {
    /// Identify the language of `text`, or `None` if it cannot tell
    fn identify(&self, text: &str) -> Option<Detection>;
}

/// Statistical identifier backed by `whatlang`
///
/// Non-Latin scripts (Hangul, kana, Han) are identified by script with full
/// confidence; Latin and Cyrillic text goes through trigram scoring, whose
/// confidence drops for short or mixed text. Tags are ISO 639-1 where one
/// exists, else the ISO 639-3 code.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangIdentifier;

impl LanguageIdentifier for WhatlangIdentifier {
    #[allow(clippy::cast_possible_truncation)]
    fn identify(&self, text: &str) -> Option<Detection> {
        let info = whatlang::detect(text)?;

        Some(Detection {
            language: tag_for(info.lang()).to_string(),
            confidence: info.confidence() as f32,
        })
    }
}

/// Short tag used by the voice table
fn tag_for(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Pol => "pl",
        Lang::Swe => "sv",
        Lang::Tur => "tr",
        Lang::Vie => "vi",
        Lang::Tha => "th",
        Lang::Ind => "id",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        other => other.code(),
    }
}

/// Language detector with a guaranteed answer
#[derive(Clone)]
pub struct LanguageDetector {
    identifier: Arc<dyn LanguageIdentifier>,
    fallback: String,
    min_confidence: f32,
}

impl LanguageDetector {
    #[must_use]
    pub fn new(
        identifier: Arc<dyn LanguageIdentifier>,
        fallback: impl Into<String>,
        min_confidence: f32,
    ) -> Self {
        Self {
            identifier,
            fallback: fallback.into(),
            min_confidence,
        }
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Return the language tag of `text`, or the fallback tag
    #[must_use]
    pub fn detect(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return self.fallback.clone();
        }

        match self.identifier.identify(text) {
            Some(d) if d.confidence >= self.min_confidence && !d.language.is_empty() => {
                tracing::debug!(language = %d.language, confidence = d.confidence, "detected language");
                d.language
            }
            Some(d) => {
                tracing::debug!(
                    language = %d.language,
                    confidence = d.confidence,
                    fallback = %self.fallback,
                    "low-confidence detection, using fallback"
                );
                self.fallback.clone()
            }
            None => {
                tracing::debug!(fallback = %self.fallback, "language indeterminate, using fallback");
                self.fallback.clone()
            }
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(
            Arc::new(WhatlangIdentifier),
            DEFAULT_FALLBACK_LANGUAGE,
            DEFAULT_MIN_CONFIDENCE,
        )
    }
}

impl std::fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("fallback", &self.fallback)
            .field("min_confidence", &self.min_confidence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identify(text: &str) -> Option<String> {
        WhatlangIdentifier.identify(text).map(|d| d.language)
    }

    #[test]
    fn identifies_cjk_by_script() {
        assert_eq!(identify("こんにちは、元気ですか？今日はどうでしたか。").as_deref(), Some("ja"));
        assert_eq!(identify("안녕하세요, 오늘 하루는 어땠어요?").as_deref(), Some("ko"));
        assert_eq!(identify("你今天過得好嗎？我一直在這裡陪你。").as_deref(), Some("zh"));
    }

    #[test]
    fn identifies_latin_languages_apart() {
        assert_eq!(
            identify(
                "I am really glad you told me about your day. It sounds like you worked very hard, \
                 and you deserve a quiet evening with a warm cup of tea."
            )
            .as_deref(),
            Some("en")
        );
        assert_eq!(
            identify(
                "Je suis vraiment contente que tu me parles de ta journée. Tu as beaucoup \
                 travaillé aujourd'hui et tu mérites une soirée tranquille avec une tasse de thé."
            )
            .as_deref(),
            Some("fr")
        );
        assert_eq!(
            identify(
                "Me alegra mucho que me cuentes cómo fue tu día. Has trabajado muchísimo \
                 y te mereces una noche tranquila con una taza de té caliente."
            )
            .as_deref(),
            Some("es")
        );
        assert_eq!(
            identify(
                "Ich freue mich wirklich, dass du mir von deinem Tag erzählst. Du hast heute \
                 sehr viel gearbeitet und verdienst einen ruhigen Abend mit einer Tasse Tee."
            )
            .as_deref(),
            Some("de")
        );
    }

    #[test]
    fn confidence_is_a_share() {
        let d = WhatlangIdentifier.identify("안녕하세요").unwrap();
        assert!((0.0..=1.0).contains(&d.confidence));
    }

    #[test]
    fn symbols_only_is_indeterminate() {
        assert_eq!(identify("123 !!! ..."), None);
    }

    #[test]
    fn detector_falls_back_on_indeterminate() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect("12345"), "zh-TW");
        assert_eq!(detector.detect("   "), "zh-TW");
    }

    struct Fixed(&'static str, f32);

    impl LanguageIdentifier for Fixed {
        fn identify(&self, _text: &str) -> Option<Detection> {
            Some(Detection {
                language: self.0.to_string(),
                confidence: self.1,
            })
        }
    }

    #[test]
    fn detector_falls_back_on_low_confidence() {
        let detector = LanguageDetector::new(Arc::new(Fixed("en", 0.3)), "und", 0.5);
        assert_eq!(detector.detect("hello"), "und");

        let detector = LanguageDetector::new(Arc::new(Fixed("en", 0.5)), "und", 0.5);
        assert_eq!(detector.detect("hello"), "en");
    }

    #[test]
    fn detector_accepts_custom_identifier() {
        let detector = LanguageDetector::new(Arc::new(Fixed("ko", 1.0)), "en", 0.5);
        assert_eq!(detector.detect("anything"), "ko");
    }
}
