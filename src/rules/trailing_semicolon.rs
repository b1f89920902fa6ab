use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::config::{Config, ConfigError};
use crate::fixture::{corrections, examples};
use crate::lint_context::LintContext;
use crate::rule::{Correction, Rule, RuleCategory, RuleDescription, RuleTrigger, TokenFilter, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::TokenKind;
use crate::types::{ByteRange, Severity, SeverityConfig};

const IDENTIFIER: &str = "trailing-semicolon";

static TRAILING_SEMICOLONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m);+(?=[ \t]*\r?$)").unwrap());

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Trailing Semicolon",
    explanation: "Lines should not have trailing semicolons.",
    category: RuleCategory::Idiomatic,
    min_language_version: None,
    is_opt_in: false,
    non_triggering_examples: examples(&[
        "let a = 0",
        "let a = 0; let b = 1",
        "let a = \"0;\"",
        "let a = 0 // done;",
        "/* block; */\nlet a = 0",
    ]),
    triggering_examples: examples(&[
        "let a = 0↓;\n",
        "let a = 0↓;\nlet b = 1",
        "let a = 0↓;;\n",
        "let a = 0↓;    \n",
    ]),
    corrections: corrections(&[
        ("let foo = 0↓;\n", "let foo = 0\n"),
        ("let foo = 0↓;\nlet bar = 1", "let foo = 0\nlet bar = 1"),
        ("let foo = 0↓;;\n", "let foo = 0\n"),
        ("let foo = 0↓;    \n", "let foo = 0    \n"),
    ]),
});

/// Flags semicolons that end a line.
#[derive(Debug, Clone, Default)]
pub struct TrailingSemicolon {
    config: SeverityConfig,
}

impl TrailingSemicolon {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }
}

impl Rule for TrailingSemicolon {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::File
    }

    fn severity(&self) -> Severity {
        self.config.severity
    }

    fn is_correctable(&self) -> bool {
        true
    }

    fn validate_file(&self, ctx: &LintContext) -> Vec<Violation> {
        let candidates = TRAILING_SEMICOLONS
            .find_iter(ctx.source)
            .filter_map(matched_range);

        ctx.filter_matches(candidates, TokenFilter::Excluding(&[TokenKind::Comment, TokenKind::String]))
            .into_iter()
            .map(|range| {
                Violation::new(IDENTIFIER, self.severity(), range.location, "Lines should not have trailing semicolons")
                    .with_correction(Correction::deletion(range))
            })
            .collect()
    }

    fn default_config_section(&self) -> Option<(String, toml::Value)> {
        default_config_section(IDENTIFIER, &SeverityConfig::default())
    }

    fn from_config(config: &Config) -> Result<Box<dyn Rule>, ConfigError>
    where
        Self: Sized,
    {
        let rule_config = load_rule_config_for::<SeverityConfig>(config, IDENTIFIER)?;
        Ok(Box::new(Self::from_config_struct(rule_config)))
    }
}

fn matched_range(result: fancy_regex::Result<fancy_regex::Match<'_>>) -> Option<ByteRange> {
    match result {
        Ok(m) => Some(ByteRange::from(m.range())),
        Err(err) => {
            log::debug!("{IDENTIFIER}: regex match failed: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxProvider;
    use crate::syntax::light::LightSyntax;

    fn check(source: &str) -> Vec<Violation> {
        let snapshot = LightSyntax.parse(source).unwrap();
        let ctx = LintContext::new(source, &snapshot);
        TrailingSemicolon::default().validate(&ctx)
    }

    #[test]
    fn test_semicolon_run_is_one_violation() {
        let violations = check("let a = 0;;\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].byte_offset, 9);
        assert_eq!(
            violations[0].correction,
            Some(Correction::deletion(ByteRange::new(9, 2)))
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let violations = check("let a = 0;\r\nlet b = 1;\r\n");
        let offsets: Vec<usize> = violations.iter().map(|v| v.byte_offset).collect();
        assert_eq!(offsets, vec![9, 21]);
    }

    #[test]
    fn test_inner_semicolons_are_ignored() {
        assert!(check("let a = 0; let b = 1\n").is_empty());
    }

    #[test]
    fn test_failed_matches_are_dropped() {
        let failed = Err(fancy_regex::Error::RuntimeError(fancy_regex::RuntimeError::BacktrackLimitExceeded));
        assert_eq!(matched_range(failed), None);

        let found = TRAILING_SEMICOLONS.find("let a = 0;\n").unwrap().unwrap();
        assert_eq!(matched_range(Ok(found)), Some(ByteRange::new(9, 1)));
    }

    #[test]
    fn test_semicolons_in_comments_and_strings() {
        assert!(check("let a = \"x;\"\n// note;\n/* a;\n b; */\n").is_empty());
    }
}
