//! JSON persistence of trained tokenizers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WbpeError};
use crate::model::Tokenizer;
use crate::vocab::VocabularyBuilder;

/// Version written into every tokenizer file.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk layout of a trained tokenizer.
///
/// Trained tokens are stored in ID order, so a token's position is its ID; the
/// reserved tokens follow implicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerFile {
    /// Format version, currently [`FORMAT_VERSION`].
    pub version: u32,
    /// Marker appended to the last symbol of every word.
    pub end_of_word_marker: String,
    /// Text of the reserved unknown token.
    pub unknown_token: String,
    /// Text of the reserved end-of-text token.
    pub end_of_text_token: String,
    /// Trained tokens in ID order.
    pub tokens: Vec<String>,
}

impl TokenizerFile {
    /// Captures the persistent state of a tokenizer.
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Self {
        let vocab = tokenizer.vocabulary();
        Self {
            version: FORMAT_VERSION,
            end_of_word_marker: tokenizer.end_of_word_marker().to_owned(),
            unknown_token: vocab.unknown_token().to_owned(),
            end_of_text_token: vocab.end_of_text_token().to_owned(),
            tokens: vocab.trained_tokens().to_vec(),
        }
    }

    /// Checks the marker and reserved tokens against the rules training enforces.
    fn validate_header(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(WbpeError::Serialization(format!(
                "unsupported tokenizer format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        let marker = self.end_of_word_marker.as_str();
        if marker.is_empty() {
            return Err(WbpeError::Serialization(
                "end_of_word_marker must not be empty".into(),
            ));
        }
        for (name, token) in [
            ("unknown_token", &self.unknown_token),
            ("end_of_text_token", &self.end_of_text_token),
        ] {
            if token.is_empty() {
                return Err(WbpeError::Serialization(format!("{name} must not be empty")));
            }
            if token.contains(marker) {
                return Err(WbpeError::Serialization(format!(
                    "{name} {token:?} contains the end-of-word marker"
                )));
            }
        }
        if self.unknown_token == self.end_of_text_token {
            return Err(WbpeError::Serialization(
                "unknown_token and end_of_text_token must differ".into(),
            ));
        }
        Ok(())
    }

    /// Rebuilds the tokenizer, re-checking every vocabulary invariant.
    pub fn into_tokenizer(self) -> Result<Tokenizer> {
        self.validate_header()?;
        let reserved = [self.unknown_token.as_str(), self.end_of_text_token.as_str()];
        let mut builder = VocabularyBuilder::new();
        for (id, token) in self.tokens.iter().enumerate() {
            if token.is_empty() {
                return Err(WbpeError::Serialization(format!("token {id} is empty")));
            }
            if *token == self.end_of_word_marker || reserved.contains(&token.as_str()) {
                return Err(WbpeError::Serialization(format!(
                    "token {token:?} at id {id} collides with the marker or a reserved token"
                )));
            }
            if !builder.insert(token)? {
                return Err(WbpeError::Serialization(format!(
                    "duplicate token {token:?} at id {id}"
                )));
            }
        }
        let vocab = builder.finish(&self.unknown_token, &self.end_of_text_token)?;
        Tokenizer::from_vocabulary(vocab, self.end_of_word_marker)
    }
}

/// Serialises the tokenizer to a JSON string.
pub fn tokenizer_json(tokenizer: &Tokenizer, pretty: bool) -> Result<String> {
    let file = TokenizerFile::from_tokenizer(tokenizer);
    let json = if pretty {
        serde_json::to_string_pretty(&file)?
    } else {
        serde_json::to_string(&file)?
    };
    Ok(json)
}

/// Parses a tokenizer from a JSON string.
pub fn tokenizer_from_json(json: &str) -> Result<Tokenizer> {
    let file: TokenizerFile = serde_json::from_str(json)?;
    file.into_tokenizer()
}

/// Persists the tokenizer as JSON at `path`.
pub fn save_json<P: AsRef<Path>>(tokenizer: &Tokenizer, path: P, pretty: bool) -> Result<()> {
    let json = tokenizer_json(tokenizer, pretty)?;
    fs::write(path.as_ref(), json)
        .map_err(|err| WbpeError::io(err, Some(path.as_ref().to_path_buf())))
}

/// Loads a tokenizer written by [`save_json`].
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Tokenizer> {
    let json = fs::read_to_string(path.as_ref())
        .map_err(|err| WbpeError::io(err, Some(path.as_ref().to_path_buf())))?;
    tokenizer_from_json(&json)
}
