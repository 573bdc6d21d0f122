//! Prompt templates for HR field extraction

use crate::config::StructurerConfig;
use crate::providers::{CompletionRequest, ExtractionTask};
use crate::types::HrCategory;

/// Token budget for the keyword list
const KEYWORDS_BUDGET: u32 = 100;
/// Token budget for the category label
const CATEGORY_BUDGET: u32 = 50;
/// Token budget for the entities JSON
const ENTITIES_BUDGET: u32 = 500;
/// Token budget for the sentiment JSON
const SENTIMENT_BUDGET: u32 = 200;

/// Builds one completion request per extracted field
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    keyword_count: usize,
    sentiment_keyword_limit: usize,
    summary_words: usize,
    short_input_chars: usize,
    long_input_chars: usize,
    max_tokens: u32,
}

impl PromptBuilder {
    pub fn new(config: &StructurerConfig) -> Self {
        Self {
            keyword_count: config.processing.keyword_count,
            sentiment_keyword_limit: config.processing.sentiment_keyword_limit,
            summary_words: config.processing.summary_words,
            short_input_chars: config.processing.short_input_chars,
            long_input_chars: config.processing.long_input_chars,
            max_tokens: config.llm.max_tokens,
        }
    }

    /// Token budget for a field, bounded by the configured ceiling
    pub fn budget(&self, task: ExtractionTask) -> u32 {
        let field = match task {
            ExtractionTask::Keywords => KEYWORDS_BUDGET,
            ExtractionTask::Category => CATEGORY_BUDGET,
            ExtractionTask::Entities => ENTITIES_BUDGET,
            ExtractionTask::Sentiment => SENTIMENT_BUDGET,
            ExtractionTask::Summary => u32::try_from(self.summary_words * 2).unwrap_or(u32::MAX),
        };
        field.min(self.max_tokens)
    }

    fn request(&self, task: ExtractionTask, system: &str, prompt: String) -> CompletionRequest {
        CompletionRequest {
            task,
            system: system.to_string(),
            prompt,
            max_tokens: self.budget(task),
        }
    }

    pub fn keywords(&self, text: &str) -> CompletionRequest {
        self.request(
            ExtractionTask::Keywords,
            "Du er en HR-spesialist som trekker ut relevante HR-relaterte nøkkelord fra tekst på norsk.",
            format!(
                "Trekk ut {count} HR-relaterte nøkkelord eller fraser fra følgende tekst på norsk. \
                 Svar kun med nøkkelordene, adskilt med komma:\n\n{text}",
                count = self.keyword_count,
                text = truncate_chars(text, self.short_input_chars),
            ),
        )
    }

    pub fn category(&self, text: &str) -> CompletionRequest {
        self.request(
            ExtractionTask::Category,
            "Du er en HR-spesialist som kategoriserer HR-dokumenter basert på gitte kategorier.",
            format!(
                "Kategoriser følgende HR-relaterte tekst i en av disse kategoriene: {categories}. \
                 Svar kun med kategorinavnet:\n\n{text}",
                categories = HrCategory::prompt_list(),
                text = truncate_chars(text, self.short_input_chars),
            ),
        )
    }

    pub fn entities(&self, text: &str) -> CompletionRequest {
        self.request(
            ExtractionTask::Entities,
            "Du er en HR-spesialist som trekker ut relevante enheter fra HR-relatert tekst på norsk.",
            format!(
                "Trekk ut relevante HR-enheter (ansatte, avdelinger, stillinger, kompetanser) fra \
                 følgende tekst. Returner resultatet som et JSON-objekt med nøklene 'ansatte', \
                 'avdelinger', 'stillinger' og 'kompetanser', der hver verdi er en liste av \
                 strenger:\n\n{text}",
                text = truncate_chars(text, self.long_input_chars),
            ),
        )
    }

    pub fn sentiment(&self, text: &str) -> CompletionRequest {
        self.request(
            ExtractionTask::Sentiment,
            "Du er en HR-spesialist som analyserer stemning og trekker ut nøkkelord relatert til \
             stemning fra HR-relatert tekst på norsk.",
            format!(
                "Analyser følgende HR-relaterte tekst og trekk ut nøkkelord relatert til stemning. \
                 Fokuser på ord og fraser som indikerer positive eller negative følelser, holdninger \
                 eller oppfatninger. Returner resultatet som et JSON-objekt med nøklene 'positive' \
                 og 'negative', hver med en liste av {limit} relevante nøkkelord:\n\n{text}",
                limit = self.sentiment_keyword_limit,
                text = truncate_chars(text, self.long_input_chars),
            ),
        )
    }

    pub fn summary(&self, text: &str) -> CompletionRequest {
        self.request(
            ExtractionTask::Summary,
            "Du er en HR-spesialist som lager konsise sammendrag av HR-relatert tekst på norsk.",
            format!(
                "Lag et HR-fokusert sammendrag på rundt {words} ord av følgende tekst på norsk:\n\n{text}",
                words = self.summary_words,
                text = truncate_chars(text, self.long_input_chars),
            ),
        )
    }
}

/// First `max_chars` characters of `text`, cut on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
