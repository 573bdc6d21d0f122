//! Turns decoded text into one structured record

use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::config::StructurerConfig;
use crate::error::{Error, Result};
use crate::extraction::{preview, FieldExtractor};
use crate::ingestion::{is_norwegian, LanguageDetector, WhatlangDetector};
use crate::providers::LlmProvider;
use crate::types::{DegradedField, FieldOutcome, StructureReport, StructuredDocument};

/// UTF-8 byte order mark
const BOM: char = '\u{feff}';

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+").expect("URL pattern is valid")
    })
}

/// Split a leading source URL from the document text
///
/// Only the first `scan_lines` non-blank lines are inspected, and the URL must
/// start its line. Returns the URL, if any, and the trimmed remaining body.
pub fn extract_url(text: &str, scan_lines: usize) -> (Option<String>, String) {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();

    let found = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .take(scan_lines)
        .find_map(|(idx, line)| {
            let candidate = line.trim_start();
            url_pattern()
                .find(candidate)
                .map(|m| (idx, m.as_str().to_string(), candidate[m.end()..].trim().to_string()))
        });

    let Some((idx, url, rest)) = found else {
        return (None, text.trim().to_string());
    };

    let mut body: Vec<&str> = Vec::with_capacity(lines.len());
    body.extend_from_slice(&lines[..idx]);
    if !rest.is_empty() {
        body.push(&rest);
    }
    body.extend_from_slice(&lines[idx + 1..]);

    (Some(url), body.join("\n").trim().to_string())
}

/// Display title from a filename
///
/// `quarterly_report-Q3.docx` becomes `Quarterly Report Q3`.
pub fn derive_title(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    stem.replace("docx", "")
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Orchestrates language check, URL split, title and field extraction
pub struct DocumentStructurer {
    extractor: FieldExtractor,
    detector: Arc<dyn LanguageDetector>,
    url_scan_lines: usize,
    expected_language: String,
}

impl DocumentStructurer {
    /// Create a structurer with the default language detector
    pub fn new(llm: Arc<dyn LlmProvider>, config: &StructurerConfig) -> Self {
        Self::with_detector(llm, Arc::new(WhatlangDetector::new()), config)
    }

    pub fn with_detector(
        llm: Arc<dyn LlmProvider>,
        detector: Arc<dyn LanguageDetector>,
        config: &StructurerConfig,
    ) -> Self {
        Self {
            extractor: FieldExtractor::new(llm, config),
            detector,
            url_scan_lines: config.processing.url_scan_lines,
            expected_language: config.processing.expected_language.clone(),
        }
    }

    fn is_expected_language(&self, code: &str) -> bool {
        if is_norwegian(&self.expected_language) {
            is_norwegian(code)
        } else {
            code.eq_ignore_ascii_case(&self.expected_language)
        }
    }

    /// Structure decoded text into a record
    ///
    /// Inference calls run sequentially: keywords, category, entities,
    /// sentiment, summary.
    pub async fn structure(&self, text: &str, filename: &str) -> Result<StructureReport> {
        if text.trim().is_empty() {
            return Err(Error::EmptyContent(filename.to_string()));
        }

        let language = self.detector.detect(text);
        let language_warning = match language.as_deref() {
            Some(code) if self.is_expected_language(code) => false,
            Some(code) => {
                tracing::warn!(
                    "'{}' appears to be written in '{}', not '{}'; results may be inaccurate",
                    filename,
                    code,
                    self.expected_language
                );
                true
            }
            None => {
                tracing::warn!("Could not detect the language of '{}'", filename);
                true
            }
        };

        let (url, body) = extract_url(text, self.url_scan_lines);
        let title = derive_title(filename);
        let mut degraded = Vec::new();

        let fail = |e: Error| {
            tracing::error!(
                "Error structuring '{}': {} (content: {})",
                filename,
                e,
                preview(&body, 100)
            );
            Error::structuring(filename, e.to_string())
        };

        let tags = self.extractor.keywords(&body).await.map_err(&fail)?;
        let category = record_outcome(
            "category",
            self.extractor.category(&body).await.map_err(&fail)?,
            &mut degraded,
        );
        let entities = record_outcome(
            "entities",
            self.extractor.entities(&body).await.map_err(&fail)?,
            &mut degraded,
        );
        let sentiment = record_outcome(
            "sentiment",
            self.extractor.sentiment(&body).await,
            &mut degraded,
        );
        let summary = self.extractor.summary(&body).await.map_err(&fail)?;

        Ok(StructureReport {
            document: StructuredDocument {
                title,
                body,
                summary,
                tags,
                url,
                category,
                entities,
                positive: sentiment.positive,
                negative: sentiment.negative,
            },
            language,
            language_warning,
            degraded,
        })
    }
}

fn record_outcome<T>(field: &str, outcome: FieldOutcome<T>, degraded: &mut Vec<DegradedField>) -> T {
    if let Some(reason) = outcome.reason() {
        tracing::warn!("Field '{}' degraded: {}", field, reason);
        degraded.push(DegradedField {
            field: field.to_string(),
            reason: reason.to_string(),
        });
    }
    outcome.into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::{CompletionRequest, ExtractionTask};
    use crate::types::HrCategory;
    use mockall::Sequence;

    struct FixedLanguage(Option<&'static str>);

    impl LanguageDetector for FixedLanguage {
        fn detect(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn scripted_mock(sentiment: &'static str) -> MockLlmProvider {
        let mut mock = MockLlmProvider::new();
        let mut seq = Sequence::new();
        let responses = [
            (ExtractionTask::Keywords, "permisjon, ferie"),
            (ExtractionTask::Category, "Personaladministrasjon"),
            (ExtractionTask::Entities, r#"{"ansatte": [], "avdelinger": ["HR"], "stillinger": [], "kompetanser": []}"#),
            (ExtractionTask::Sentiment, sentiment),
            (ExtractionTask::Summary, "Kort om permisjon."),
        ];
        for (task, response) in responses {
            mock.expect_complete()
                .withf(move |req: &CompletionRequest| req.task == task)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(response.to_string()));
        }
        mock
    }

    fn structurer(mock: MockLlmProvider, language: Option<&'static str>) -> DocumentStructurer {
        DocumentStructurer::with_detector(
            Arc::new(mock),
            Arc::new(FixedLanguage(language)),
            &StructurerConfig::default(),
        )
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("quarterly_report-Q3.docx"), "Quarterly Report Q3");
        assert_eq!(derive_title("uploads/ferie_POLICY.pdf"), "Ferie Policy");
        assert_eq!(derive_title("C:\\docs\\rutiner.docx.txt"), "Rutiner.");
        assert_eq!(derive_title(".bashrc"), ".bashrc");
        assert_eq!(derive_title("ærlig-øving.txt"), "Ærlig Øving");
    }

    #[test]
    fn test_extract_url() {
        let (url, body) = extract_url("https://example.com/doc\nRest of content", 3);
        assert_eq!(url.as_deref(), Some("https://example.com/doc"));
        assert_eq!(body, "Rest of content");
    }

    #[test]
    fn test_extract_url_same_line_and_bom() {
        let (url, body) = extract_url("\u{feff}\n  http://intra.net/a  Første linje\nAndre", 3);
        assert_eq!(url.as_deref(), Some("http://intra.net/a"));
        assert_eq!(body, "Første linje\nAndre");
    }

    #[test]
    fn test_extract_url_absent_or_too_late() {
        let (url, body) = extract_url("  Bare tekst.  ", 3);
        assert_eq!(url, None);
        assert_eq!(body, "Bare tekst.");

        let late = "a\nb\nc\nhttps://example.com/late";
        let (url, body) = extract_url(late, 3);
        assert_eq!(url, None);
        assert_eq!(body, late);

        let (url, _) = extract_url("Se https://example.com/inline", 3);
        assert_eq!(url, None);
    }

    #[test]
    fn test_title_and_url_are_pure() {
        let text = "https://example.com/doc\nInnhold";
        assert_eq!(extract_url(text, 3), extract_url(text, 3));
        assert_eq!(derive_title("a_b.txt"), derive_title("a_b.txt"));
    }

    #[tokio::test]
    async fn test_structure_in_call_order() {
        let report = structurer(
            scripted_mock(r#"{"positive": ["fleksibel"], "negative": []}"#),
            Some("nob"),
        )
        .structure("https://example.com/doc\nAnsatte har rett til permisjon.", "permisjon_regler.txt")
        .await
        .unwrap();

        let doc = &report.document;
        assert_eq!(doc.title, "Permisjon Regler");
        assert_eq!(doc.url.as_deref(), Some("https://example.com/doc"));
        assert_eq!(doc.body, "Ansatte har rett til permisjon.");
        assert_eq!(doc.tags, vec!["permisjon", "ferie"]);
        assert_eq!(doc.category, HrCategory::PersonnelAdministration);
        assert_eq!(doc.entities.departments, vec!["HR"]);
        assert_eq!(doc.positive, vec!["fleksibel"]);
        assert_eq!(doc.summary, "Kort om permisjon.");
        assert!(!report.language_warning);
        assert!(report.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_sentiment_keeps_document() {
        let report = structurer(scripted_mock("Stemningen er god."), Some("eng"))
            .structure("Some English text.", "notes.txt")
            .await
            .unwrap();

        assert!(report.document.positive.is_empty());
        assert!(report.document.negative.is_empty());
        assert_eq!(report.degraded_fields(), vec!["sentiment"]);
        assert!(report.language_warning);
        assert_eq!(report.language.as_deref(), Some("eng"));
    }

    #[tokio::test]
    async fn test_whitespace_text_is_empty_content() {
        let result = structurer(MockLlmProvider::new(), Some("nob"))
            .structure(" \n\t ", "tom.txt")
            .await;
        assert!(matches!(result, Err(Error::EmptyContent(_))));
    }

    #[tokio::test]
    async fn test_keyword_failure_fails_document() {
        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(Error::llm("service unavailable")));

        let result = structurer(mock, None)
            .structure("Tekst", "a.txt")
            .await;
        assert!(matches!(result, Err(Error::Structuring { .. })));
    }
}
