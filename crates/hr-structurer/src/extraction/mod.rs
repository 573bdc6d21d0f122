//! LLM-backed extraction of the structured record fields

mod extractor;
pub mod parse;

pub use extractor::FieldExtractor;
pub use parse::{
    extract_json_object, parse_category, parse_entities, parse_keywords, parse_sentiment,
    preview, truncate_words,
};
