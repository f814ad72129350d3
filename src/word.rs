//! Symbol-sequence representation of a single pre-token.

use crate::error::{Result, WbpeError};

/// Ordered, mutable list of symbols making up one word.
///
/// The last symbol always carries the end-of-word marker, so merges never
/// cross word boundaries and the boundary survives into the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    symbols: Vec<String>,
}

impl Word {
    /// Builds a word of one symbol per character, appending `marker` to the last one.
    pub fn from_pre_token(pre_token: &str, marker: &str) -> Result<Self> {
        if marker.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "end-of-word marker must not be empty".into(),
            ));
        }
        if pre_token.is_empty() {
            return Err(WbpeError::InvalidConfig(
                "cannot build a word from an empty pre-token".into(),
            ));
        }
        if pre_token.contains(marker) {
            return Err(WbpeError::InvalidConfig(format!(
                "end-of-word marker {marker:?} occurs inside pre-token {pre_token:?}; \
                 choose a marker absent from the input"
            )));
        }
        let mut symbols: Vec<String> = pre_token.chars().map(String::from).collect();
        if let Some(last) = symbols.last_mut() {
            last.push_str(marker);
        }
        Ok(Self { symbols })
    }

    /// Returns the current symbols in order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Consumes the word, returning its symbols.
    #[must_use]
    pub fn into_symbols(self) -> Vec<String> {
        self.symbols
    }

    /// Number of symbols currently in the word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// A word built through [`Word::from_pre_token`] is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns true when the word contains at least two symbols.
    #[must_use]
    pub fn has_pairs(&self) -> bool {
        self.symbols.len() >= 2
    }

    /// Invokes the provided closure for each adjacent `(left, right)` symbol pair.
    pub fn for_each_pair<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str),
    {
        for window in self.symbols.windows(2) {
            f(&window[0], &window[1]);
        }
    }

    /// Concatenation of all symbols, marker included.
    #[must_use]
    pub fn text(&self) -> String {
        self.symbols.concat()
    }

    /// Replaces every adjacent pair whose concatenation equals `merged`.
    ///
    /// Occurrences are taken left to right without overlap. Returns the number
    /// of replacements; the word shrinks by one symbol per replacement.
    pub fn merge(&mut self, merged: &str) -> usize {
        if self.symbols.len() < 2 {
            return 0;
        }

        let mut merges = 0usize;
        let mut out: Vec<String> = Vec::with_capacity(self.symbols.len());
        let mut symbols = std::mem::take(&mut self.symbols).into_iter().peekable();
        while let Some(left) = symbols.next() {
            let joins = symbols
                .peek()
                .is_some_and(|right| pair_equals(&left, right, merged));
            if joins {
                symbols.next();
                out.push(merged.to_owned());
                merges += 1;
            } else {
                out.push(left);
            }
        }
        self.symbols = out;
        merges
    }

    /// Merges the pair starting at `index` into a single symbol.
    ///
    /// Returns `false` and leaves the word untouched when `index + 1` is out of range.
    pub fn merge_at(&mut self, index: usize) -> bool {
        if index + 1 >= self.symbols.len() {
            return false;
        }
        let right = self.symbols.remove(index + 1);
        self.symbols[index].push_str(&right);
        true
    }
}

fn pair_equals(left: &str, right: &str, merged: &str) -> bool {
    merged.len() == left.len() + right.len()
        && merged.starts_with(left)
        && merged.ends_with(right)
}
