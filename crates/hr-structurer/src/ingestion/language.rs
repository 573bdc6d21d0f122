//! Advisory language detection

/// ISO 639 codes accepted as Norwegian (Bokmål, Nynorsk, macrolanguage)
const NORWEGIAN_CODES: [&str; 4] = ["nob", "nno", "nor", "no"];

/// Classifies the language of a text
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-3 code of the detected language, `None` when undetectable
    fn detect(&self, text: &str) -> Option<String>;
}

/// Detector backed by `whatlang` trigram models
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        tracing::trace!(
            lang = info.lang().code(),
            confidence = info.confidence(),
            reliable = info.is_reliable(),
            "Language detected"
        );
        Some(info.lang().code().to_string())
    }
}

/// Whether a language code denotes Norwegian
pub fn is_norwegian(code: &str) -> bool {
    NORWEGIAN_CODES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_norwegian() {
        assert!(is_norwegian("nob"));
        assert!(is_norwegian("NNO"));
        assert!(is_norwegian("no"));
        assert!(!is_norwegian("swe"));
        assert!(!is_norwegian("eng"));
    }

    #[test]
    fn test_detects_english() {
        let text = "The quarterly report describes how the company hires new employees \
                    and how managers should run the onboarding process for every team.";
        assert_eq!(WhatlangDetector.detect(text).as_deref(), Some("eng"));
    }

    #[test]
    fn test_empty_text_is_undetectable() {
        assert_eq!(WhatlangDetector.detect(""), None);
    }
}
