//! Metrics describing the evolution of the training process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reason a training run terminated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The configured maximum vocabulary size was reached.
    TargetVocabReached,
    /// No adjacent pair reached the minimum frequency, so merging stopped early.
    PairsExhausted,
    /// The configured maximum merge iterations was reached.
    MaxIterationsReached,
}

/// Metrics captured for each merge iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IterationMetrics {
    /// Sequential iteration number (1-indexed).
    pub iteration: usize,
    /// Text of the merged token.
    pub merged_token: String,
    /// Count of the winning pair.
    pub best_frequency: usize,
    /// Number of pair replacements performed across the distinct words.
    pub merges_applied: usize,
    /// Count of distinct pairs seen during the iteration.
    pub distinct_pairs: usize,
    /// Trained vocabulary size after the iteration.
    pub vocab_size: usize,
    /// Whether the merged text was new to the vocabulary.
    pub new_token: bool,
    /// Execution time for the iteration.
    pub elapsed_iteration: Duration,
    /// Total time elapsed since training started.
    pub elapsed_total: Duration,
}

/// Aggregate metrics produced by a training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetrics {
    /// Number of distinct pre-tokens in the corpus.
    pub distinct_words: usize,
    /// Number of seed symbols assigned before merging.
    pub seed_symbols: usize,
    /// Per-iteration snapshots accrued during training.
    pub iterations: Vec<IterationMetrics>,
    /// Total duration of the training session.
    pub total_duration: Duration,
    /// Reason training terminated.
    pub stop_reason: StopReason,
}

impl TrainingMetrics {
    /// Creates an empty metrics container with pre-allocated capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            distinct_words: 0,
            seed_symbols: 0,
            iterations: Vec::with_capacity(capacity),
            total_duration: Duration::ZERO,
            stop_reason: StopReason::TargetVocabReached,
        }
    }

    /// Returns true when training filled the vocabulary up to the configured size.
    #[must_use]
    pub fn target_reached(&self) -> bool {
        self.stop_reason == StopReason::TargetVocabReached
    }

    /// Number of merges that created a new vocabulary entry.
    #[must_use]
    pub fn new_tokens(&self) -> usize {
        self.iterations.iter().filter(|it| it.new_token).count()
    }
}
