//! Core training loop producing a merge vocabulary from a text corpus.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::fmt;
use std::time::Instant;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::config::{PairWeighting, TrainerBuilder, TrainerConfig};
use crate::error::{Result, WbpeError};
use crate::metrics::{IterationMetrics, StopReason, TrainingMetrics};
use crate::model::Tokenizer;
use crate::pretokenize::pre_tokens;
use crate::vocab::VocabularyBuilder;
use crate::word::Word;

/// High-level façade configuring and executing BPE training runs.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
}

/// Artifacts returned after a training session completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Trained tokenizer.
    pub tokenizer: Tokenizer,
    /// Detailed metrics captured during training.
    pub metrics: TrainingMetrics,
}

/// A distinct pre-token of the corpus and how often it occurred.
#[derive(Debug, Clone)]
struct TrainingWord {
    word: Word,
    occurrences: usize,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainerConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`TrainerBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    /// Trains a vocabulary from an in-memory corpus.
    pub fn train(&self, corpus: &str) -> Result<TrainerArtifacts> {
        self.cfg.validate()?;
        let training_start = Instant::now();
        let marker = self.cfg.end_of_word_marker.as_str();
        let max_vocab = self.cfg.max_vocab_size;

        let mut words = collect_words(corpus, marker)?;
        let mut builder = VocabularyBuilder::new();
        let seed_symbols = seed_vocabulary(&words, marker, &mut builder)?;
        if seed_symbols > max_vocab {
            return Err(WbpeError::InvalidConfig(format!(
                "initial vocabulary size ({seed_symbols}) larger than max_vocab_size ({max_vocab}); \
                 increase it to at least {seed_symbols}"
            )));
        }

        let capacity = (max_vocab - seed_symbols).min(16_384);
        let mut metrics = TrainingMetrics::new(capacity);
        metrics.distinct_words = words.len();
        metrics.seed_symbols = seed_symbols;

        let mut iteration = 0usize;
        let stop_reason = loop {
            if builder.len() >= max_vocab {
                break StopReason::TargetVocabReached;
            }
            if let Some(max_iters) = self.cfg.max_merge_iterations {
                if iteration >= max_iters {
                    break StopReason::MaxIterationsReached;
                }
            }

            let iteration_start = Instant::now();
            let pair_counts = compute_pair_counts(&words, self.cfg.pair_weighting);
            let Some(best) = select_best_pair(&pair_counts) else {
                break StopReason::PairsExhausted;
            };
            if best.frequency < self.cfg.min_frequency {
                break StopReason::PairsExhausted;
            }

            let merged = best.text.to_owned();
            let frequency = best.frequency;
            let merges_applied = apply_merge(&mut words, &merged);
            let new_token = builder.insert(&merged)?;
            if !new_token {
                debug!("merged token {merged:?} already in vocabulary; no new ID assigned");
            }
            iteration += 1;

            if self.cfg.show_progress {
                info!(
                    "iter {:>6} freq {:>8} merges {:>8} distinct_pairs {:>8} vocab {:>8} token {:?}",
                    iteration,
                    frequency,
                    merges_applied,
                    pair_counts.len(),
                    builder.len(),
                    merged
                );
            }

            metrics.iterations.push(IterationMetrics {
                iteration,
                merged_token: merged,
                best_frequency: frequency,
                merges_applied,
                distinct_pairs: pair_counts.len(),
                vocab_size: builder.len(),
                new_token,
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
            });
        };

        if stop_reason == StopReason::PairsExhausted {
            warn!(
                "merging stopped at vocabulary size {} (maximum allowed {max_vocab}) because no further merges are possible",
                builder.len()
            );
        }
        metrics.stop_reason = stop_reason;

        let vocab = builder.finish(&self.cfg.unknown_token, &self.cfg.end_of_text_token)?;
        let tokenizer = Tokenizer::from_vocabulary(vocab, marker)?;
        metrics.total_duration = training_start.elapsed();

        if self.cfg.show_progress {
            info!(
                "completed {} merges in {:.2?}; vocab size {}",
                metrics.iterations.len(),
                metrics.total_duration,
                tokenizer.vocab_size()
            );
        }

        Ok(TrainerArtifacts { tokenizer, metrics })
    }
}

/// Pre-tokenizes the corpus into distinct words, keeping first-seen order and occurrence counts.
fn collect_words(corpus: &str, marker: &str) -> Result<Vec<TrainingWord>> {
    if corpus.contains(marker) {
        return Err(WbpeError::InvalidConfig(format!(
            "end-of-word marker {marker:?} occurs in the training text; choose a marker absent from the corpus"
        )));
    }

    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut words: Vec<TrainingWord> = Vec::new();
    for pre_token in pre_tokens(corpus) {
        match index.entry(pre_token) {
            Entry::Occupied(slot) => words[*slot.get()].occurrences += 1,
            Entry::Vacant(slot) => {
                let word = Word::from_pre_token(slot.key(), marker)?;
                slot.insert(words.len());
                words.push(TrainingWord {
                    word,
                    occurrences: 1,
                });
            }
        }
    }

    if words.is_empty() {
        return Err(WbpeError::InvalidConfig(
            "training requires at least one word in the text".into(),
        ));
    }
    Ok(words)
}

/// Assigns IDs to every distinct initial symbol in first-seen order, then to the
/// other positional form of each character (`b` for `b@` and `b@` for `b`).
///
/// Completing both forms lets any character seen in training be encoded at any
/// position of a word. Returns the number of seed symbols.
fn seed_vocabulary(
    words: &[TrainingWord],
    marker: &str,
    builder: &mut VocabularyBuilder,
) -> Result<usize> {
    let mut observed: Vec<&str> = Vec::new();
    for training_word in words {
        for symbol in training_word.word.symbols() {
            if builder.insert(symbol)? {
                observed.push(symbol.as_str());
            }
        }
    }
    for symbol in observed {
        let counterpart = match symbol.strip_suffix(marker) {
            Some(bare) => bare.to_owned(),
            None => format!("{symbol}{marker}"),
        };
        builder.insert(&counterpart)?;
    }
    Ok(builder.len())
}

fn compute_pair_counts(words: &[TrainingWord], weighting: PairWeighting) -> FxHashMap<String, usize> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for training_word in words {
        let weight = match weighting {
            PairWeighting::Occurrences => training_word.occurrences,
            PairWeighting::DistinctWords => 1,
        };
        training_word.word.for_each_pair(|left, right| {
            let mut key = String::with_capacity(left.len() + right.len());
            key.push_str(left);
            key.push_str(right);
            *counts.entry(key).or_insert(0) += weight;
        });
    }
    counts
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct PairScore<'a> {
    frequency: usize,
    text: &'a str,
}

impl Ord for PairScore<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.frequency
            .cmp(&other.frequency)
            .then_with(|| other.text.cmp(self.text))
    }
}

impl PartialOrd for PairScore<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Highest count wins; ties go to the lexicographically smallest pair text.
fn select_best_pair(pair_counts: &FxHashMap<String, usize>) -> Option<PairScore<'_>> {
    pair_counts
        .iter()
        .map(|(text, &frequency)| PairScore {
            frequency,
            text: text.as_str(),
        })
        .max()
}

fn apply_merge(words: &mut [TrainingWord], merged: &str) -> usize {
    words
        .iter_mut()
        .map(|training_word| training_word.word.merge(merged))
        .sum()
}

impl fmt::Display for TrainerArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BPE tokenizer with vocab size {}",
            self.tokenizer.vocab_size()
        )?;
        writeln!(f, "Stop reason: {:?}", self.metrics.stop_reason)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(max_vocab_size: usize) -> Trainer {
        let cfg = TrainerConfig::builder()
            .max_vocab_size(max_vocab_size)
            .end_of_word_marker("@")
            .show_progress(false)
            .build()
            .unwrap();
        Trainer::new(cfg)
    }

    #[test]
    fn repeated_word_is_merged_first() {
        let artefacts = trainer(100).train("ab ab ab c").unwrap();
        let tokenizer = &artefacts.tokenizer;
        assert_eq!(
            tokenizer.vocabulary().trained_tokens(),
            &["a", "b@", "c@", "a@", "b", "c", "ab@"]
        );
        assert_eq!(artefacts.metrics.seed_symbols, 6);
        assert_eq!(artefacts.metrics.distinct_words, 2);
        assert_eq!(artefacts.metrics.stop_reason, StopReason::PairsExhausted);
        assert_eq!(artefacts.metrics.iterations[0].best_frequency, 3);
        assert_eq!(tokenizer.encode("ab").unwrap(), vec![6]);
    }

    #[test]
    fn single_word_corpus_exhausts_merges() {
        let artefacts = trainer(100).train("hi").unwrap();
        assert!(artefacts.metrics.iterations.is_empty());
        assert_eq!(artefacts.metrics.stop_reason, StopReason::PairsExhausted);
        assert!(!artefacts.metrics.target_reached());
        assert_eq!(artefacts.tokenizer.trained_vocab_size(), 4);
        assert!(artefacts.tokenizer.vocab_size() < 100 + 2);
    }

    #[test]
    fn training_stops_at_max_vocab_size() {
        let corpus = "the cat sat on the mat; the cat ate the rat. that cat!";
        // 26 seed symbols, then "at@" (7 occurrences) and "th" (5).
        let artefacts = trainer(28).train(corpus).unwrap();
        assert_eq!(artefacts.metrics.seed_symbols, 26);
        let merged: Vec<&str> = artefacts
            .metrics
            .iterations
            .iter()
            .map(|it| it.merged_token.as_str())
            .collect();
        assert_eq!(merged, vec!["at@", "th"]);
        assert_eq!(artefacts.tokenizer.trained_vocab_size(), 28);
        assert_eq!(artefacts.tokenizer.vocab_size(), 30);
        assert!(artefacts.metrics.target_reached());
    }

    #[test]
    fn max_vocab_equal_to_seed_count_performs_no_merges() {
        let artefacts = trainer(6).train("ab ab ab c").unwrap();
        assert!(artefacts.metrics.iterations.is_empty());
        assert_eq!(artefacts.tokenizer.trained_vocab_size(), 6);
        assert_eq!(artefacts.tokenizer.unknown_id(), 6);
        assert_eq!(artefacts.tokenizer.end_of_text_id(), 7);
    }

    #[test]
    fn rejects_vocab_smaller_than_seed_symbols() {
        let err = trainer(5).train("ab ab ab c").unwrap_err();
        assert!(matches!(
            err,
            WbpeError::InvalidConfig(message) if message.contains("initial vocabulary size (6)")
        ));
    }

    #[test]
    fn rejects_corpus_without_words() {
        let err = trainer(10).train("  \t#$%  ").unwrap_err();
        assert!(matches!(err, WbpeError::InvalidConfig(_)));
        assert!(trainer(10).train("").is_err());
    }

    #[test]
    fn rejects_marker_in_corpus() {
        let err = trainer(10).train("mail me @ home").unwrap_err();
        assert!(matches!(
            err,
            WbpeError::InvalidConfig(message) if message.contains("marker")
        ));
    }

    #[test]
    fn ties_break_on_smallest_pair_text() {
        // "xy" and "ab" both occur twice; "ab@" sorts before "xy@".
        let artefacts = trainer(100).train("xy ab xy ab").unwrap();
        let trained = artefacts.tokenizer.vocabulary().trained_tokens();
        assert_eq!(
            trained,
            &["x", "y@", "a", "b@", "x@", "y", "a@", "b", "ab@", "xy@"]
        );
        let again = trainer(100).train("xy ab xy ab").unwrap();
        assert_eq!(again.tokenizer.vocabulary(), artefacts.tokenizer.vocabulary());
    }

    #[test]
    fn distinct_word_weighting_ignores_repetition() {
        let cfg = TrainerConfig::builder()
            .max_vocab_size(100)
            .end_of_word_marker("@")
            .pair_weighting(PairWeighting::DistinctWords)
            .show_progress(false)
            .build()
            .unwrap();
        let artefacts = Trainer::new(cfg).train("ab ab ab c").unwrap();
        assert!(artefacts.metrics.iterations.is_empty());
        assert_eq!(artefacts.tokenizer.trained_vocab_size(), 6);

        let cfg = TrainerConfig::builder()
            .max_vocab_size(100)
            .end_of_word_marker("@")
            .pair_weighting(PairWeighting::DistinctWords)
            .show_progress(false)
            .build()
            .unwrap();
        let artefacts = Trainer::new(cfg).train("abc abd").unwrap();
        assert_eq!(artefacts.metrics.iterations[0].merged_token, "ab");
    }

    #[test]
    fn merge_iteration_cap_is_honoured() {
        let cfg = TrainerConfig::builder()
            .max_vocab_size(1_000)
            .end_of_word_marker("@")
            .max_merge_iterations(Some(2))
            .show_progress(false)
            .build()
            .unwrap();
        let corpus = "lower lowest newer newest wider widest lower newer";
        let artefacts = Trainer::new(cfg).train(corpus).unwrap();
        assert_eq!(artefacts.metrics.iterations.len(), 2);
        assert_eq!(
            artefacts.metrics.stop_reason,
            StopReason::MaxIterationsReached
        );
    }

    #[test]
    fn min_frequency_controls_early_stop() {
        let cfg = TrainerConfig::builder()
            .max_vocab_size(100)
            .end_of_word_marker("@")
            .min_frequency(4)
            .show_progress(false)
            .build()
            .unwrap();
        let artefacts = Trainer::new(cfg).train("ab ab ab c").unwrap();
        assert!(artefacts.metrics.iterations.is_empty());
        assert_eq!(artefacts.metrics.stop_reason, StopReason::PairsExhausted);
    }

    #[test]
    fn pair_counts_are_weighted_by_occurrences() {
        let words = collect_words("aa aa b", "@").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].occurrences, 2);
        let counts = compute_pair_counts(&words, PairWeighting::Occurrences);
        assert_eq!(counts.get("aa@"), Some(&2));
        let counts = compute_pair_counts(&words, PairWeighting::DistinctWords);
        assert_eq!(counts.get("aa@"), Some(&1));
    }

    #[test]
    fn best_pair_prefers_frequency_then_text() {
        let mut counts = FxHashMap::default();
        counts.insert("zz".to_string(), 5);
        counts.insert("bb".to_string(), 7);
        counts.insert("aa".to_string(), 7);
        let best = select_best_pair(&counts).unwrap();
        assert_eq!(best.text, "aa");
        assert_eq!(best.frequency, 7);
        assert!(select_best_pair(&FxHashMap::default()).is_none());
    }

    #[test]
    fn trained_vocabulary_respects_bounds() {
        let corpus = "It was a dark and stormy night; the rain fell in torrents, except at \
                      occasional intervals, when it was checked by a violent gust of wind.";
        for max in [60, 80, 120, 500] {
            let artefacts = trainer(max).train(corpus).unwrap();
            let tokenizer = &artefacts.tokenizer;
            assert!(tokenizer.trained_vocab_size() <= max);
            assert!(tokenizer.trained_vocab_size() >= artefacts.metrics.seed_symbols);
            assert_eq!(
                tokenizer.trained_vocab_size(),
                artefacts.metrics.seed_symbols + artefacts.metrics.new_tokens()
            );
        }
    }

    #[test]
    fn seeds_cover_both_positional_forms() {
        let artefacts = trainer(4).train("ab ba").unwrap();
        assert_eq!(
            artefacts.tokenizer.vocabulary().trained_tokens(),
            &["a", "b@", "b", "a@"]
        );

        let mut builder = VocabularyBuilder::new();
        let words = collect_words("ab ab c", "</w>").unwrap();
        assert_eq!(seed_vocabulary(&words, "</w>", &mut builder).unwrap(), 6);
        for symbol in ["a", "a</w>", "b", "b</w>", "c", "c</w>"] {
            assert!(builder.contains(symbol), "missing seed {symbol:?}");
        }
    }

    #[test]
    fn corpus_characters_encode_at_any_word_position() {
        let tokenizer = trainer(100).train("ab ab ab c").unwrap().tokenizer;
        let ids = tokenizer.encode("ba c").unwrap();
        assert!(!ids.contains(&tokenizer.unknown_id()));
        assert_eq!(tokenizer.decode(&ids).unwrap(), "ba@c@");
    }
}
