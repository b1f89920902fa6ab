use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, ConfigError};
use crate::fixture::{corrections, examples};
use crate::lint_context::LintContext;
use crate::rule::{Correction, Rule, RuleCategory, RuleDescription, RuleTrigger, TokenFilter, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::TokenKind;
use crate::types::{ByteRange, Severity, SeverityConfig};

const IDENTIFIER: &str = "comma-spacing";

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([ \t]*),([ \t]*)").unwrap());

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Comma Spacing",
    explanation: "There should be no space before and one after any comma.",
    category: RuleCategory::Style,
    min_language_version: None,
    is_opt_in: false,
    non_triggering_examples: examples(&[
        "func abc(a: String, b: String) { }",
        "abc(a: \"string\", b: \"string\")",
        "enum a { case a, b, c }",
        "let result = plus(\n    first: 3,\n    second: 4\n)",
        "let text = \"a ,b\"",
        "// a ,b",
        "let a = [1,\n    2]",
    ]),
    triggering_examples: examples(&[
        "func abc(a: String↓ ,b: String) { }",
        "func abc(a: String↓,b: String) { }",
        "abc(a: \"string\"↓,b: \"string\")",
        "enum a { case a↓ ,b }",
        "let result = plus(first: 3↓ , second: 4)",
        "let a = [1↓,  2]",
    ]),
    corrections: corrections(&[
        ("func abc(a: String↓,b: String) {}", "func abc(a: String, b: String) {}"),
        ("abc(a: \"string\"↓,b: \"string\")", "abc(a: \"string\", b: \"string\")"),
        ("enum a { case a↓ ,b }", "enum a { case a, b }"),
        ("let a = [1↓ ,  2]", "let a = [1, 2]"),
        ("let a = [1↓ ,\n    2]", "let a = [1,\n    2]"),
    ]),
});

/// Requires `, ` between list items: nothing before the comma, one space after it.
#[derive(Debug, Clone, Default)]
pub struct CommaSpacing {
    config: SeverityConfig,
}

impl CommaSpacing {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }

    /// The span to rewrite for the comma at `comma`, with its replacement,
    /// or `None` when the spacing is already fine.
    fn misplaced_span(source: &str, before: ByteRange, comma: usize, after: ByteRange) -> Option<Correction> {
        let indentation = before.location == 0 || source.as_bytes().get(before.location - 1) == Some(&b'\n');
        let before_ok = before.is_empty() || indentation;

        let next = source.as_bytes().get(after.upper_bound()).copied();
        let line_end = matches!(next, None | Some(b'\n' | b'\r'));
        let after_ok = line_end || after.slice(source) == Some(" ");

        if before_ok && after_ok {
            return None;
        }

        let start = if before_ok { comma } else { before.location };
        Some(if line_end {
            Correction::new(ByteRange::from_bounds(start, comma + 1), ",")
        } else {
            Correction::new(ByteRange::from_bounds(start, after.upper_bound()), ", ")
        })
    }
}

impl Rule for CommaSpacing {
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
        let filter = TokenFilter::Excluding(&[TokenKind::Comment, TokenKind::String]);
        COMMA
            .captures_iter(ctx.source)
            .filter_map(|caps| {
                let before = ByteRange::from(caps.get(1)?.range());
                let after = ByteRange::from(caps.get(2)?.range());
                let comma = before.upper_bound();
                if !filter.accepts(ctx.snapshot.tokens.kinds_overlapping(ByteRange::new(comma, 1))) {
                    return None;
                }
                Self::misplaced_span(ctx.source, before, comma, after)
            })
            .map(|correction| {
                Violation::new(
                    IDENTIFIER,
                    self.severity(),
                    correction.range.location,
                    "There should be no space before and one after any comma",
                )
                .with_correction(correction)
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
