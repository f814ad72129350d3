//! Replays trained merges on new text and maps the resulting symbols to IDs.

use log::debug;

use crate::error::{Result, WbpeError};
use crate::model::TokenId;
use crate::pretokenize::pre_tokens;
use crate::vocab::Vocabulary;
use crate::word::Word;

/// Repeatedly merges the adjacent pair with the lowest trained ID until none applies.
///
/// Each pass performs exactly one merge, at the leftmost occurrence of the
/// earliest-learned pair, so the loop runs at most `word.len() - 1` times.
pub fn apply_merges(vocab: &Vocabulary, mut word: Word) -> Word {
    let mut candidate = String::new();
    loop {
        let mut best: Option<(TokenId, usize)> = None;
        for (index, window) in word.symbols().windows(2).enumerate() {
            candidate.clear();
            candidate.push_str(&window[0]);
            candidate.push_str(&window[1]);
            if let Some(id) = vocab.trained_id(&candidate) {
                if best.map_or(true, |(best_id, _)| id < best_id) {
                    best = Some((id, index));
                }
            }
        }
        match best {
            Some((_, index)) => {
                word.merge_at(index);
            }
            None => return word,
        }
    }
}

fn ensure_marker_absent(text: &str, marker: &str) -> Result<()> {
    if text.contains(marker) {
        return Err(WbpeError::InvalidConfig(format!(
            "end-of-word marker {marker:?} occurs in the input text; choose a marker absent from the input"
        )));
    }
    Ok(())
}

/// Splits `text` into words and applies the trained merges to each of them.
pub(crate) fn segment(vocab: &Vocabulary, marker: &str, text: &str) -> Result<Vec<Word>> {
    ensure_marker_absent(text, marker)?;
    pre_tokens(text)
        .map(|pre_token| Word::from_pre_token(&pre_token, marker).map(|w| apply_merges(vocab, w)))
        .collect()
}

/// Appends the ID of every symbol of `word`, substituting the unknown ID for missing ones.
pub(crate) fn push_symbol_ids(vocab: &Vocabulary, word: &Word, out: &mut Vec<TokenId>) {
    for symbol in word.symbols() {
        match vocab.trained_id(symbol) {
            Some(id) => out.push(id),
            None => {
                debug!(
                    "unknown token {symbol:?}: substituting unknown token ID {}",
                    vocab.unknown_id()
                );
                out.push(vocab.unknown_id());
            }
        }
    }
}

/// Encodes `text` into token IDs in left-to-right, word-by-word order.
pub(crate) fn encode(vocab: &Vocabulary, marker: &str, text: &str) -> Result<Vec<TokenId>> {
    let words = segment(vocab, marker, text)?;
    let mut ids = Vec::with_capacity(words.iter().map(Word::len).sum());
    for word in &words {
        push_symbol_ids(vocab, word, &mut ids);
    }
    Ok(ids)
}
