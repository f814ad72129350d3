//! Configuration builders controlling vocabulary training.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WbpeError};
use crate::model::TokenId;

/// Default text of the reserved token substituted for out-of-vocabulary symbols.
pub const DEFAULT_UNKNOWN_TOKEN: &str = "<|unknown|>";
/// Default text of the reserved token separating independent documents.
pub const DEFAULT_END_OF_TEXT_TOKEN: &str = "<|end-of-text|>";
/// Default end-of-word marker (ASCII unit separator), never produced by the pre-tokenizer.
pub const DEFAULT_END_OF_WORD_MARKER: &str = "\u{1F}";

/// Number of reserved tokens appended after the trained vocabulary.
pub const RESERVED_TOKEN_COUNT: usize = 2;

/// How adjacent pair occurrences are accumulated across the training words.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PairWeighting {
    /// Every occurrence of a word in the corpus contributes to its pair counts.
    #[default]
    Occurrences,
    /// Every distinct word contributes once, regardless of how often it occurs.
    DistinctWords,
}

/// Configuration for word-level BPE training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    /// Upper bound on the trained vocabulary (seed symbols plus merges), excluding reserved tokens.
    pub max_vocab_size: usize,
    /// Sentinel appended to the last symbol of every word.
    pub end_of_word_marker: String,
    /// Minimum pair count required before a merge is performed.
    pub min_frequency: usize,
    /// Pair counting policy.
    pub pair_weighting: PairWeighting,
    /// Hard cap on merge iterations; `None` runs until the vocabulary is full or pairs run out.
    pub max_merge_iterations: Option<usize>,
    /// Enables per-iteration logging through the `log` facade.
    pub show_progress: bool,
    /// Text of the reserved unknown token.
    pub unknown_token: String,
    /// Text of the reserved end-of-text token.
    pub end_of_text_token: String,
}

impl TrainerConfig {
    /// Returns a builder initialised with [`TrainerConfig::default`].
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::default()
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.max_vocab_size == 0 {
            return Err(WbpeError::InvalidConfig(
                "max_vocab_size must be greater than zero".into(),
            ));
        }
        let max_ids = usize::try_from(TokenId::MAX).unwrap_or(usize::MAX);
        if self.max_vocab_size > max_ids - RESERVED_TOKEN_COUNT {
            return Err(WbpeError::InvalidConfig(format!(
                "max_vocab_size ({}) leaves no room for reserved tokens below {max_ids}",
                self.max_vocab_size
            )));
        }
        if self.end_of_word_marker.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "end_of_word_marker must not be empty".into(),
            ));
        }
        if self.min_frequency == 0 {
            return Err(WbpeError::InvalidConfig(
                "min_frequency must be greater than zero".into(),
            ));
        }
        for (name, token) in [
            ("unknown_token", &self.unknown_token),
            ("end_of_text_token", &self.end_of_text_token),
        ] {
            if token.is_empty() {
                return Err(WbpeError::InvalidConfig(format!("{name} must not be empty")));
            }
            if token.contains(self.end_of_word_marker.as_str()) {
                return Err(WbpeError::InvalidConfig(format!(
                    "{name} {token:?} contains the end-of-word marker"
                )));
            }
        }
        if self.unknown_token == self.end_of_text_token {
            return Err(WbpeError::InvalidConfig(
                "unknown_token and end_of_text_token must differ".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: 200,
            end_of_word_marker: DEFAULT_END_OF_WORD_MARKER.into(),
            min_frequency: 2,
            pair_weighting: PairWeighting::default(),
            max_merge_iterations: None,
            show_progress: true,
            unknown_token: DEFAULT_UNKNOWN_TOKEN.into(),
            end_of_text_token: DEFAULT_END_OF_TEXT_TOKEN.into(),
        }
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainerBuilder {
    cfg: TrainerConfig,
}

impl TrainerBuilder {
    /// Creates a builder with [`TrainerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum trained vocabulary size (reserved tokens excluded).
    #[must_use]
    pub fn max_vocab_size(mut self, value: usize) -> Self {
        self.cfg.max_vocab_size = value;
        self
    }

    /// Sets the end-of-word marker.
    #[must_use]
    pub fn end_of_word_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.cfg.end_of_word_marker = marker.into();
        self
    }

    /// Sets the minimum merge frequency.
    #[must_use]
    pub fn min_frequency(mut self, value: usize) -> Self {
        self.cfg.min_frequency = value;
        self
    }

    /// Selects how pair occurrences are weighted.
    #[must_use]
    pub fn pair_weighting(mut self, weighting: PairWeighting) -> Self {
        self.cfg.pair_weighting = weighting;
        self
    }

    /// Sets a hard merge iteration limit.
    #[must_use]
    pub fn max_merge_iterations(mut self, value: Option<usize>) -> Self {
        self.cfg.max_merge_iterations = value;
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Overrides the texts of the two reserved tokens.
    #[must_use]
    pub fn reserved_tokens<U, E>(mut self, unknown: U, end_of_text: E) -> Self
    where
        U: Into<String>,
        E: Into<String>,
    {
        self.cfg.unknown_token = unknown.into();
        self.cfg.end_of_text_token = end_of_text.into();
        self
    }

    /// Finalises the builder, returning a validated [`TrainerConfig`].
    pub fn build(self) -> Result<TrainerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
