//! Parsers turning raw model responses into typed field values
//!
//! Models wrap JSON in code fences, prepend prose, quote keywords and number
//! their lists. Every parser here is lenient about that and never fails: a
//! response that cannot be read yields a degraded default instead.

use serde_json::{Map, Value};
use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Entities, FieldOutcome, HrCategory, SentimentKeywords};

/// Characters stripped from both ends of list items
const ITEM_TRIM: &[char] = &['"', '\'', '`', '*', '-', '•', '.', '[', ']'];

/// Locate a JSON object in a response that may contain markdown or prose
///
/// Looks for a ```json block, then a plain ``` block, then the outermost
/// braces.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        let content_start = text[block_start..]
            .find('\n')
            .map(|i| block_start + i + 1)
            .unwrap_or(block_start);
        if let Some(end) = text[content_start..].find("```") {
            let block = text[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse a JSON object out of a response
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(extract_json_object(text)?) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Clean a single list item
fn clean_item(item: &str) -> String {
    let item = item.trim();
    // Drop list numbering such as "1." or "2)"
    let item = match item.find(['.', ')']) {
        Some(idx) if idx > 0 && item[..idx].chars().all(|c| c.is_ascii_digit()) => &item[idx + 1..],
        _ => item,
    };
    item.trim().trim_matches(ITEM_TRIM).trim().to_string()
}

/// Parse a comma-separated keyword response, keeping the first `limit` items
pub fn parse_keywords(response: &str, limit: usize) -> Vec<String> {
    response
        .split([',', '\n', ';'])
        .map(clean_item)
        .filter(|item| !item.is_empty())
        .take(limit)
        .collect()
}

fn normalize_label(text: &str) -> String {
    text.trim()
        .trim_matches(ITEM_TRIM)
        .trim()
        .to_lowercase()
}

/// Map a category response onto the closed set
///
/// Exact label match (Norwegian or English) first, then containment.
/// Anything else degrades to `Other`.
pub fn parse_category(response: &str) -> FieldOutcome<HrCategory> {
    let normalized = normalize_label(response);

    let exact = HrCategory::ALL.into_iter().find(|c| {
        normalized == c.label().to_lowercase() || normalized == c.english_label().to_lowercase()
    });
    if let Some(category) = exact {
        return FieldOutcome::Extracted(category);
    }

    let contained = HrCategory::ALL
        .into_iter()
        .filter(|c| *c != HrCategory::Other)
        .find(|c| {
            normalized.contains(&c.label().to_lowercase())
                || normalized.contains(&c.english_label().to_lowercase())
        });
    match contained {
        Some(category) => FieldOutcome::Extracted(category),
        None => FieldOutcome::degraded(
            HrCategory::Other,
            format!("unrecognized category '{}'", preview(response, 40)),
        ),
    }
}

/// Read a value as a list of strings
///
/// Accepts a list (non-string items are stringified), a single string, or null.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.to_string()],
    };
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

/// First present key among the aliases
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

/// Parse an entities response
pub fn parse_entities(response: &str) -> FieldOutcome<Entities> {
    let Some(map) = parse_object(response) else {
        return FieldOutcome::degraded(
            Entities::from_raw(response),
            "response was not a JSON object",
        );
    };

    FieldOutcome::Extracted(Entities {
        employees: string_list(lookup(&map, &["ansatte", "employees"])),
        departments: string_list(lookup(&map, &["avdelinger", "departments"])),
        positions: string_list(lookup(&map, &["stillinger", "positions"])),
        competencies: string_list(lookup(&map, &["kompetanser", "competencies"])),
        raw: None,
    })
}

/// Parse a sentiment response, capping each list at `limit`
///
/// Both `positive` and `negative` must be present.
pub fn parse_sentiment(response: &str, limit: usize) -> FieldOutcome<SentimentKeywords> {
    let Some(map) = parse_object(response) else {
        return FieldOutcome::degraded(
            SentimentKeywords::default(),
            "response was not a JSON object",
        );
    };

    let (Some(positive), Some(negative)) = (map.get("positive"), map.get("negative")) else {
        return FieldOutcome::degraded(
            SentimentKeywords::default(),
            "missing 'positive' or 'negative' key",
        );
    };

    let mut positive = string_list(Some(positive));
    let mut negative = string_list(Some(negative));
    positive.truncate(limit);
    negative.truncate(limit);

    FieldOutcome::Extracted(SentimentKeywords { positive, negative })
}

/// Cap text at `max_words` words, keeping punctuation of the kept words
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let text = text.trim();
    match text.unicode_word_indices().nth(max_words) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Escaped preview of at most `max_graphemes` graphemes, for log lines
pub fn preview(text: &str, max_graphemes: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max_graphemes).collect();
    let mut escaped = head.escape_debug().to_string();
    if graphemes.next().is_some() {
        escaped.push_str("...");
    }
    escaped
}
