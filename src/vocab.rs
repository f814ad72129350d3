//! Bidirectional token ↔ ID vocabulary store.

use rustc_hash::FxHashMap;

use crate::error::{Result, WbpeError};
use crate::model::TokenId;

/// Accumulates tokens in creation order, assigning consecutive IDs.
#[derive(Debug, Default, Clone)]
pub struct VocabularyBuilder {
    token_to_id: FxHashMap<String, TokenId>,
}

impl VocabularyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    /// Returns true when nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Returns true if `token` already has an ID.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Assigns the next ID to `token`.
    ///
    /// Returns `Ok(false)` without consuming an ID when the token already exists.
    pub fn insert(&mut self, token: &str) -> Result<bool> {
        if self.token_to_id.contains_key(token) {
            return Ok(false);
        }
        let id = TokenId::try_from(self.token_to_id.len())
            .map_err(|_| WbpeError::Invariant("vocabulary size exceeded TokenId range".into()))?;
        self.token_to_id.insert(token.to_owned(), id);
        Ok(true)
    }

    /// Appends the reserved tokens and builds the inverse ID → token table.
    pub fn finish(mut self, unknown_token: &str, end_of_text_token: &str) -> Result<Vocabulary> {
        let trained_len = self.token_to_id.len();
        for reserved in [unknown_token, end_of_text_token] {
            if !self.insert(reserved)? {
                return Err(WbpeError::InvalidConfig(format!(
                    "reserved token {reserved:?} collides with an existing vocabulary entry"
                )));
            }
        }

        let mut slots: Vec<Option<String>> = vec![None; self.token_to_id.len()];
        for (token, &id) in &self.token_to_id {
            let slot = slots.get_mut(id as usize).ok_or_else(|| {
                WbpeError::Invariant(format!(
                    "token {token:?} has ID {id} outside the vocabulary range"
                ))
            })?;
            if let Some(existing) = slot.as_ref() {
                return Err(WbpeError::Invariant(format!(
                    "ID {id} assigned to both {existing:?} and {token:?}"
                )));
            }
            *slot = Some(token.clone());
        }
        let id_to_token = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.ok_or_else(|| {
                    WbpeError::Invariant(format!("ID {id} has no token in the inverse table"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let unknown_id = trained_len as TokenId;
        Ok(Vocabulary {
            token_to_id: self.token_to_id,
            id_to_token,
            unknown_id,
            end_of_text_id: unknown_id + 1,
        })
    }
}

/// Trained vocabulary: tokens in creation order followed by the two reserved tokens.
///
/// A lower ID means the token was created earlier during training, which the
/// encoder uses as merge priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    token_to_id: FxHashMap<String, TokenId>,
    id_to_token: Vec<String>,
    unknown_id: TokenId,
    end_of_text_id: TokenId,
}

impl Vocabulary {
    /// Total number of entries, reserved tokens included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Always false for a finished vocabulary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Number of trained entries (seed symbols plus merges).
    #[must_use]
    pub fn trained_len(&self) -> usize {
        self.unknown_id as usize
    }

    /// ID of the reserved unknown token.
    #[must_use]
    pub fn unknown_id(&self) -> TokenId {
        self.unknown_id
    }

    /// ID of the reserved end-of-text token.
    #[must_use]
    pub fn end_of_text_id(&self) -> TokenId {
        self.end_of_text_id
    }

    /// Text of the reserved unknown token.
    #[must_use]
    pub fn unknown_token(&self) -> &str {
        &self.id_to_token[self.unknown_id as usize]
    }

    /// Text of the reserved end-of-text token.
    #[must_use]
    pub fn end_of_text_token(&self) -> &str {
        &self.id_to_token[self.end_of_text_id as usize]
    }

    /// Looks up the ID of any token, reserved tokens included.
    #[must_use]
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.token_to_id.get(token).copied()
    }

    /// Looks up the ID of a trained token; reserved tokens are never returned.
    #[must_use]
    pub fn trained_id(&self, token: &str) -> Option<TokenId> {
        self.token_to_id(token).filter(|&id| !self.is_reserved(id))
    }

    /// Looks up the text of an ID.
    #[must_use]
    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Returns true when `id` names one of the reserved tokens.
    #[must_use]
    pub fn is_reserved(&self, id: TokenId) -> bool {
        id == self.unknown_id || id == self.end_of_text_id
    }

    /// Trained tokens in ID order.
    #[must_use]
    pub fn trained_tokens(&self) -> &[String] {
        &self.id_to_token[..self.trained_len()]
    }

    /// Iterates over every `(id, token)` entry in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> + '_ {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (id as TokenId, token.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        let mut builder = VocabularyBuilder::new();
        for token in ["a", "b@", "c@", "ab@"] {
            assert!(builder.insert(token).expect("insert"));
        }
        builder.finish("<unk>", "<eot>").expect("finish")
    }

    #[test]
    fn ids_follow_insertion_order() {
        let vocab = sample();
        assert_eq!(vocab.token_to_id("a"), Some(0));
        assert_eq!(vocab.token_to_id("ab@"), Some(3));
        assert_eq!(vocab.trained_len(), 4);
        assert_eq!(vocab.len(), 6);
        assert_eq!(vocab.unknown_id(), 4);
        assert_eq!(vocab.end_of_text_id(), 5);
        assert_eq!(vocab.unknown_token(), "<unk>");
        assert_eq!(vocab.end_of_text_token(), "<eot>");
        assert_eq!(vocab.trained_tokens(), &["a", "b@", "c@", "ab@"]);
    }

    #[test]
    fn repeated_insert_is_a_no_op() {
        let mut builder = VocabularyBuilder::new();
        assert!(builder.insert("x").expect("insert"));
        assert!(!builder.insert("x").expect("insert"));
        assert_eq!(builder.len(), 1);
        assert!(builder.contains("x"));
    }

    #[test]
    fn maps_are_mutual_inverses() {
        let vocab = sample();
        for (id, token) in vocab.iter() {
            assert_eq!(vocab.token_to_id(token), Some(id));
            assert_eq!(vocab.id_to_token(id), Some(token));
        }
        assert_eq!(vocab.iter().count(), vocab.len());
        assert_eq!(vocab.id_to_token(6), None);
    }

    #[test]
    fn reserved_tokens_are_not_trained_ids() {
        let vocab = sample();
        assert_eq!(vocab.token_to_id("<unk>"), Some(4));
        assert_eq!(vocab.trained_id("<unk>"), None);
        assert_eq!(vocab.trained_id("b@"), Some(1));
        assert!(vocab.is_reserved(5));
        assert!(!vocab.is_reserved(0));
    }

    #[test]
    fn reserved_collision_is_rejected() {
        let mut builder = VocabularyBuilder::new();
        builder.insert("a").expect("insert");
        let err = builder.finish("a", "<eot>").expect_err("collision");
        assert!(matches!(err, WbpeError::InvalidConfig(_)));
    }

    #[test]
    fn empty_builder_still_gets_reserved_tokens() {
        let vocab = VocabularyBuilder::new()
            .finish("<unk>", "<eot>")
            .expect("finish");
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.unknown_id(), 0);
        assert!(vocab.trained_tokens().is_empty());
    }
}
