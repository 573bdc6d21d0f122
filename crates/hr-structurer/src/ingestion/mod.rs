//! Text extraction and language detection for uploaded files

mod language;
mod parser;

pub use language::{is_norwegian, LanguageDetector, WhatlangDetector};
pub use parser::{FileParser, TextDecoder};
