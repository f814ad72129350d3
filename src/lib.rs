//! Word-level byte pair encoding (BPE) tokenizer.
//!
//! The crate trains a bounded vocabulary of subword units from a text corpus and
//! then maps arbitrary text to and from sequences of integer token IDs.  Text is
//! first split into lowercase pre-tokens (runs of ASCII letters/digits or single
//! punctuation characters), each pre-token becomes a word of one symbol per
//! character with an end-of-word marker on the last symbol, and training
//! repeatedly merges the most frequent adjacent pair.  Encoding replays those
//! merges in the order they were learned.
//!
//! ```
//! use wbpe::{Trainer, TrainerConfig};
//!
//! # fn main() -> wbpe::Result<()> {
//! let cfg = TrainerConfig::builder()
//!     .max_vocab_size(64)
//!     .end_of_word_marker("@")
//!     .show_progress(false)
//!     .build()?;
//! let artifacts = Trainer::new(cfg).train("ab ab ab c")?;
//! let tokenizer = artifacts.tokenizer;
//! let ids = tokenizer.encode("AB")?;
//! assert_eq!(ids.len(), 1);
//! assert_eq!(tokenizer.decode(&ids)?, "ab@");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod config;
mod decoder;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pretokenize;
pub mod serialization;
pub mod trainer;
pub mod vocab;
pub mod word;

pub use config::{PairWeighting, TrainerBuilder, TrainerConfig};
pub use error::{Result, WbpeError};
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use model::{TokenId, Tokenizer};
pub use trainer::{Trainer, TrainerArtifacts};
pub use vocab::Vocabulary;

/// Trains a tokenizer with default settings apart from the marker and vocabulary bound.
///
/// `max_vocab_size` bounds the trained vocabulary; the unknown and end-of-text
/// tokens are appended after it.
pub fn train(corpus: &str, end_of_word_marker: &str, max_vocab_size: usize) -> Result<Tokenizer> {
    let cfg = TrainerConfig::builder()
        .max_vocab_size(max_vocab_size)
        .end_of_word_marker(end_of_word_marker)
        .build()?;
    Ok(Trainer::new(cfg).train(corpus)?.tokenizer)
}
