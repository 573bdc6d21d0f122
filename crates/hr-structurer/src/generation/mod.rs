//! Prompt construction for field extraction

pub mod prompt;

pub use prompt::{truncate_chars, PromptBuilder};
