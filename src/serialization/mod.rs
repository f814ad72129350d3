//! Helpers for (de)serialising trained tokenizers.

pub mod json;

pub use json::{load_json, save_json, tokenizer_from_json, tokenizer_json, TokenizerFile};
