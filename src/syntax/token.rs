use super::SyntaxError;
use crate::types::ByteRange;
use serde::Serialize;

/// Lexical classification of a token. Punctuation is not tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Keyword,
    Identifier,
    String,
    Comment,
    /// Numbers, attributes (`@objc`), compiler directives (`#if`).
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: ByteRange,
}

impl Token {
    pub const fn new(kind: TokenKind, range: ByteRange) -> Self {
        Self { kind, range }
    }

    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.range.slice(source)
    }
}

/// Tokens of one file, sorted by location and never overlapping.
///
/// Since locations and upper bounds are both monotonic, every range query is
/// a pair of binary searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens lying entirely inside `range`.
    pub fn tokens_in(&self, range: ByteRange) -> &[Token] {
        let start = self.tokens.partition_point(|t| t.range.location < range.location);
        let rest = &self.tokens[start..];
        let len = rest.partition_point(|t| t.range.upper_bound() <= range.upper_bound());
        &rest[..len]
    }

    /// Tokens sharing at least one byte with `range`.
    pub fn overlapping(&self, range: ByteRange) -> &[Token] {
        if range.is_empty() {
            return &[];
        }
        let start = self.tokens.partition_point(|t| t.range.upper_bound() <= range.location);
        let end = self.tokens.partition_point(|t| t.range.location < range.upper_bound());
        if start >= end { &[] } else { &self.tokens[start..end] }
    }

    /// Kinds of the tokens sharing at least one byte with `range`.
    pub fn kinds_overlapping(&self, range: ByteRange) -> impl Iterator<Item = TokenKind> + '_ {
        self.overlapping(range).iter().map(|t| t.kind)
    }

    pub(super) fn check_invariants(&self, source_len: usize) -> Result<(), SyntaxError> {
        let mut previous_end = 0;
        for (idx, token) in self.tokens.iter().enumerate() {
            if token.range.is_empty() {
                return Err(SyntaxError::Contract(format!("token {idx} is empty")));
            }
            if token.range.location < previous_end {
                return Err(SyntaxError::Contract(format!(
                    "token {idx} at {} overlaps or precedes the previous token",
                    token.range
                )));
            }
            let end = match token.range.checked_upper_bound() {
                Some(end) if end <= source_len => end,
                _ => {
                    return Err(SyntaxError::Contract(format!(
                        "token {idx} at {} exceeds source length {source_len}",
                        token.range
                    )));
                }
            };
            previous_end = end;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{StructureTree, SyntaxSnapshot};

    fn stream() -> TokenStream {
        // for (_, foo) in bar
        TokenStream::new(vec![
            Token::new(TokenKind::Keyword, ByteRange::new(0, 3)),
            Token::new(TokenKind::Keyword, ByteRange::new(5, 1)),
            Token::new(TokenKind::Identifier, ByteRange::new(8, 3)),
            Token::new(TokenKind::Keyword, ByteRange::new(13, 2)),
            Token::new(TokenKind::Identifier, ByteRange::new(16, 3)),
        ])
    }

    #[test]
    fn test_tokens_in_exact_range() {
        let tokens = stream();
        let inside = tokens.tokens_in(ByteRange::new(4, 8));
        assert_eq!(inside.len(), 2);
        assert_eq!(inside[0].range, ByteRange::new(5, 1));
        assert_eq!(inside[1].range, ByteRange::new(8, 3));
    }

    #[test]
    fn test_tokens_in_excludes_partial_tokens() {
        let tokens = stream();
        assert!(tokens.tokens_in(ByteRange::new(9, 5)).is_empty());
    }

    #[test]
    fn test_overlapping() {
        let tokens = stream();
        let hits = tokens.overlapping(ByteRange::new(9, 5));
        assert_eq!(hits.len(), 2);
        assert!(tokens.overlapping(ByteRange::new(3, 2)).is_empty());
        assert!(tokens.overlapping(ByteRange::new(5, 0)).is_empty());
    }

    #[test]
    fn test_invariants_reject_overlap() {
        let tokens = TokenStream::new(vec![
            Token::new(TokenKind::Keyword, ByteRange::new(0, 3)),
            Token::new(TokenKind::Identifier, ByteRange::new(2, 3)),
        ]);
        assert!(tokens.check_invariants(10).is_err());
        assert!(stream().check_invariants(19).is_ok());
        assert!(stream().check_invariants(18).is_err());
    }

    #[test]
    fn test_overflowing_token_is_a_contract_error() {
        let snapshot = SyntaxSnapshot::new(
            StructureTree::default(),
            TokenStream::new(vec![Token::new(TokenKind::Identifier, ByteRange::new(1, usize::MAX))]),
            3,
        );
        assert!(matches!(snapshot, Err(SyntaxError::Contract(_))));
    }
}
