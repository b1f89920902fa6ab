use crate::rule::TokenFilter;
use crate::syntax::{SyntaxSnapshot, Token};
use crate::types::{ByteRange, LanguageVersion};
use crate::utils::LineIndex;

/// Everything a rule may read about one file.
pub struct LintContext<'a> {
    pub source: &'a str,
    pub snapshot: &'a SyntaxSnapshot,
    pub lines: LineIndex<'a>,
    pub language_version: LanguageVersion,
}

impl<'a> LintContext<'a> {
    pub fn new(source: &'a str, snapshot: &'a SyntaxSnapshot) -> Self {
        Self {
            source,
            snapshot,
            lines: LineIndex::new(source),
            language_version: LanguageVersion::default(),
        }
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    /// Source text under `range`, or `None` if it is out of bounds or splits a character.
    pub fn contents(&self, range: ByteRange) -> Option<&'a str> {
        range.slice(self.source)
    }

    /// Tokens lying entirely inside `range`.
    pub fn tokens_in(&self, range: ByteRange) -> &'a [Token] {
        self.snapshot.tokens.tokens_in(range)
    }

    /// Keep the candidate match ranges the token filter accepts.
    pub fn filter_matches(
        &self,
        matches: impl IntoIterator<Item = ByteRange>,
        filter: TokenFilter,
    ) -> Vec<ByteRange> {
        matches
            .into_iter()
            .filter(|range| filter.accepts(self.snapshot.tokens.kinds_overlapping(*range)))
            .collect()
    }

    /// Ranges of every match of `pattern` in the file that survive `filter`.
    pub fn match_pattern(&self, pattern: &regex::Regex, filter: TokenFilter) -> Vec<ByteRange> {
        self.filter_matches(
            pattern.find_iter(self.source).map(|m| ByteRange::from(m.range())),
            filter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::light::LightSyntax;
    use crate::syntax::{SyntaxProvider, TokenKind};
    use regex::Regex;

    #[test]
    fn test_match_pattern_excluding_comments() {
        let source = "let a = 1 // a TODO\nlet todo = \"TODO\"";
        let snapshot = LightSyntax.parse(source).unwrap();
        let ctx = LintContext::new(source, &snapshot);
        let pattern = Regex::new("TODO").unwrap();

        let code = ctx.match_pattern(&pattern, TokenFilter::Excluding(&[TokenKind::Comment, TokenKind::String]));
        assert!(code.is_empty());

        let comments = ctx.match_pattern(&pattern, TokenFilter::Only(&[TokenKind::Comment]));
        assert_eq!(comments, vec![ByteRange::new(15, 4)]);
    }

    #[test]
    fn test_contents_refuses_split_characters() {
        let source = "let ç = 1";
        let snapshot = LightSyntax.parse(source).unwrap();
        let ctx = LintContext::new(source, &snapshot);
        assert_eq!(ctx.contents(ByteRange::new(4, 2)), Some("ç"));
        assert_eq!(ctx.contents(ByteRange::new(4, 1)), None);
        assert_eq!(ctx.contents(ByteRange::new(8, 5)), None);
    }
}
