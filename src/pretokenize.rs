//! Pre-tokenization splitting raw text into case-folded words and punctuation.

use std::sync::OnceLock;

use regex::Regex;

/// Pattern matching a run of ASCII alphanumerics or one punctuation character.
pub const PRE_TOKEN_PATTERN: &str = r#"[a-zA-Z0-9]+|[.,;:!?'"()\[\]{}/\\]"#;

fn pre_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRE_TOKEN_PATTERN).expect("pre-token pattern is valid"))
}

/// Lazy iterator over the pre-tokens of a text.
///
/// Cloning the iterator yields an independent cursor, so the same text can be
/// walked several times without re-allocating anything.
#[derive(Debug, Clone)]
pub struct PreTokens<'t> {
    text: &'t str,
    position: usize,
}

impl<'t> PreTokens<'t> {
    fn new(text: &'t str) -> Self {
        Self { text, position: 0 }
    }

    fn next_span(&mut self) -> Option<&'t str> {
        let found = pre_token_regex().find_at(self.text, self.position)?;
        self.position = found.end();
        Some(found.as_str())
    }
}

impl Iterator for PreTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_span().map(str::to_ascii_lowercase)
    }
}

/// Splits `text` into lowercase pre-tokens.
///
/// Whitespace and any character outside the pattern are dropped. Only ASCII
/// letters are ever matched, so case folding never touches other characters.
#[must_use]
pub fn pre_tokens(text: &str) -> PreTokens<'_> {
    PreTokens::new(text)
}

/// Counts the pre-tokens of `text` without materialising them.
#[must_use]
pub fn count_pre_tokens(text: &str) -> usize {
    let mut cursor = PreTokens::new(text);
    let mut count = 0;
    while cursor.next_span().is_some() {
        count += 1;
    }
    count
}
