//! Trained tokenizer type tying the vocabulary to the encoder and decoder.

use std::path::Path;

use rayon::prelude::*;

use crate::decoder;
use crate::encoder;
use crate::error::{Result, WbpeError};
use crate::serialization::{load_json, save_json, tokenizer_from_json, tokenizer_json};
use crate::vocab::Vocabulary;

/// Token identifier used throughout the crate.
pub type TokenId = u32;

/// Trained word-level BPE tokenizer.
///
/// Immutable once built: every method takes `&self`, so a single instance can
/// serve encode and decode calls from many threads.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    vocab: Vocabulary,
    end_of_word_marker: String,
}

impl Tokenizer {
    /// Wraps a finished vocabulary together with the marker it was trained with.
    pub fn from_vocabulary<S: Into<String>>(vocab: Vocabulary, end_of_word_marker: S) -> Result<Self> {
        let end_of_word_marker = end_of_word_marker.into();
        if end_of_word_marker.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "end-of-word marker must not be empty".into(),
            ));
        }
        if vocab.token_to_id(&end_of_word_marker).is_some() {
            return Err(WbpeError::Invariant(format!(
                "end-of-word marker {end_of_word_marker:?} is itself a vocabulary entry"
            )));
        }
        Ok(Self {
            vocab,
            end_of_word_marker,
        })
    }

    /// Returns the underlying vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Total vocabulary size, reserved tokens included.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of trained tokens (seed symbols plus merges).
    #[must_use]
    pub fn trained_vocab_size(&self) -> usize {
        self.vocab.trained_len()
    }

    /// ID substituted for symbols missing from the vocabulary.
    #[must_use]
    pub fn unknown_id(&self) -> TokenId {
        self.vocab.unknown_id()
    }

    /// ID of the end-of-text sentinel.
    #[must_use]
    pub fn end_of_text_id(&self) -> TokenId {
        self.vocab.end_of_text_id()
    }

    /// Marker appended to the last symbol of every word.
    #[must_use]
    pub fn end_of_word_marker(&self) -> &str {
        &self.end_of_word_marker
    }

    /// Looks up the ID of a token.
    #[must_use]
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.vocab.token_to_id(token)
    }

    /// Looks up the text of an ID.
    #[must_use]
    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.vocab.id_to_token(id)
    }

    /// Encodes text into token IDs.
    ///
    /// Symbols missing from the vocabulary become [`Tokenizer::unknown_id`].
    /// Fails only when the end-of-word marker occurs literally in `text`.
    pub fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        encoder::encode(&self.vocab, &self.end_of_word_marker, text)
    }

    /// Returns the merged symbols of every word of `text`.
    pub fn encode_words(&self, text: &str) -> Result<Vec<Vec<String>>> {
        let words = encoder::segment(&self.vocab, &self.end_of_word_marker, text)?;
        Ok(words.into_iter().map(|word| word.into_symbols()).collect())
    }

    /// Encodes many texts in parallel.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<TokenId>>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Concatenates the token text of every ID.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
        decoder::decode(&self.vocab, ids)
    }

    /// Decodes IDs, leaving out the unknown and end-of-text tokens.
    pub fn decode_skipping_reserved(&self, ids: &[TokenId]) -> Result<String> {
        decoder::decode_skipping_reserved(&self.vocab, ids)
    }

    /// Decodes IDs and splits the result into the words delimited by the marker.
    ///
    /// An unknown token ends the word it appears in, keeping its text; an
    /// end-of-text token separates words without contributing text.
    pub fn decode_words(&self, ids: &[TokenId]) -> Result<Vec<String>> {
        decoder::decode_words(&self.vocab, &self.end_of_word_marker, ids)
    }

    /// Serialises the tokenizer to a JSON string.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        tokenizer_json(self, pretty)
    }

    /// Restores a tokenizer from a JSON string produced by [`Tokenizer::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        tokenizer_from_json(json)
    }

    /// Writes the tokenizer to disk as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path, true)
    }

    /// Loads a tokenizer previously written by [`Tokenizer::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }
}
