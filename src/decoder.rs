//! Maps token IDs back to text.

use std::mem;

use crate::error::{Result, WbpeError};
use crate::model::TokenId;
use crate::vocab::Vocabulary;

fn lookup(vocab: &Vocabulary, id: TokenId) -> Result<&str> {
    vocab.id_to_token(id).ok_or_else(|| {
        WbpeError::Invariant(format!(
            "token id {id} exceeds vocab size {}; the unknown token should cover every encoded symbol",
            vocab.len()
        ))
    })
}

/// Concatenates the token text of every ID, with no separator.
pub(crate) fn decode(vocab: &Vocabulary, ids: &[TokenId]) -> Result<String> {
    let mut text = String::new();
    for &id in ids {
        text.push_str(lookup(vocab, id)?);
    }
    Ok(text)
}

/// Like [`decode`], but omits the reserved tokens.
pub(crate) fn decode_skipping_reserved(vocab: &Vocabulary, ids: &[TokenId]) -> Result<String> {
    let mut text = String::new();
    for &id in ids {
        let token = lookup(vocab, id)?;
        if !vocab.is_reserved(id) {
            text.push_str(token);
        }
    }
    Ok(text)
}

/// Decodes `ids` into words, closing a word at every end-of-word marker.
///
/// Reserved IDs also close the current word, since the marker of an unknown
/// symbol is not recoverable. The unknown token's text is kept at the end of the
/// word it closes; end-of-text only separates words. A trailing fragment without
/// a marker (an ID sequence cut mid-word) is returned as the last element.
pub(crate) fn decode_words(vocab: &Vocabulary, marker: &str, ids: &[TokenId]) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut pending = String::new();
    for &id in ids {
        let token = lookup(vocab, id)?;
        if id == vocab.unknown_id() {
            pending.push_str(token);
            words.push(mem::take(&mut pending));
        } else if id == vocab.end_of_text_id() {
            if !pending.is_empty() {
                words.push(mem::take(&mut pending));
            }
        } else if let Some(stem) = token.strip_suffix(marker) {
            pending.push_str(stem);
            words.push(mem::take(&mut pending));
        } else {
            pending.push_str(token);
        }
    }
    if !pending.is_empty() {
        words.push(pending);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::VocabularyBuilder;

    fn vocab() -> Vocabulary {
        let mut builder = VocabularyBuilder::new();
        for token in ["h", "i@", "hi@", "a@"] {
            builder.insert(token).expect("insert");
        }
        builder.finish("<unk>", "<eot>").expect("finish")
    }

    #[test]
    fn concatenates_without_separator() {
        let v = vocab();
        assert_eq!(decode(&v, &[2, 3, 0, 1]).expect("decode"), "hi@a@hi@");
        assert_eq!(decode(&v, &[]).expect("decode"), "");
    }

    #[test]
    fn reserved_tokens_decode_to_their_text() {
        let v = vocab();
        assert_eq!(decode(&v, &[2, 4, 5]).expect("decode"), "hi@<unk><eot>");
        assert_eq!(
            decode_skipping_reserved(&v, &[2, 4, 5, 3]).expect("decode"),
            "hi@a@"
        );
    }

    #[test]
    fn out_of_range_id_is_an_invariant_violation() {
        let v = vocab();
        let err = decode(&v, &[0, 6]).expect_err("unknown id");
        assert!(err.is_invariant());
        assert!(decode_skipping_reserved(&v, &[99]).is_err());
    }

    #[test]
    fn words_are_split_at_markers() {
        let v = vocab();
        assert_eq!(
            decode_words(&v, "@", &[2, 3, 0]).expect("decode"),
            vec!["hi", "a", "h"]
        );
    }

    #[test]
    fn unknown_word_final_symbol_closes_its_word() {
        let v = vocab();
        // "hz hi" encodes as h, <unk>, hi@ when "z@" is not in the vocabulary.
        assert_eq!(
            decode_words(&v, "@", &[0, 4, 2]).expect("decode"),
            vec!["h<unk>", "hi"]
        );
        assert_eq!(
            decode_words(&v, "@", &[4, 4, 3]).expect("decode"),
            vec!["<unk>", "<unk>", "a"]
        );
    }

    #[test]
    fn end_of_text_separates_words_without_text() {
        let v = vocab();
        assert_eq!(
            decode_words(&v, "@", &[2, 5, 3]).expect("decode"),
            vec!["hi", "a"]
        );
        assert_eq!(
            decode_words(&v, "@", &[0, 5, 0, 1]).expect("decode"),
            vec!["h", "hi"]
        );
        assert!(decode_words(&v, "@", &[5]).expect("decode").is_empty());
    }
}
