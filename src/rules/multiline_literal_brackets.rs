use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, ConfigError};
use crate::fixture::examples;
use crate::lint_context::LintContext;
use crate::rule::{Rule, RuleCategory, RuleDescription, RuleTrigger, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::{StructureKind, StructureNode};
use crate::types::{Severity, SeverityConfig};

const IDENTIFIER: &str = "multiline-literal-brackets";

static OPENING_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A[ \t]*\n").unwrap());
static CLOSING_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\z").unwrap());

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Multiline Literal Brackets",
    explanation: "Multiline literals should have their surrounding brackets in a new line.",
    category: RuleCategory::Style,
    min_language_version: None,
    is_opt_in: true,
    non_triggering_examples: examples(&[
        "let trio = [\"harry\", \"ronald\", \"hermione\"]",
        "let houseCup = [\"gryffindor\": 460, \"hufflepuff\": 370]",
        "let trio = [\n    \"harry\",\n    \"ronald\",\n    \"hermione\"\n]",
        "let houseCup = [\n    \"gryffindor\": 460,\n    \"hufflepuff\": 370\n]",
        "let a = [\n  1,\n  2\n]",
        "let empty = [\n]",
    ]),
    triggering_examples: examples(&[
        "let trio = [↓\"harry\",\n    \"ronald\",\n    \"hermione\"\n]",
        "let houseCup = [↓\"gryffindor\": 460,\n    \"hufflepuff\": 370\n]",
        "let trio = [\n    \"harry\",\n    \"ronald\",\n    \"hermione\"↓]",
        "let a = [↓1,\n  2↓]",
        "foo(bar: [\n    1,\n    2↓])",
    ]),
    corrections: Vec::new(),
});

/// Requires the brackets of a multiline array or dictionary literal to sit on
/// their own lines.
#[derive(Debug, Clone, Default)]
pub struct MultilineLiteralBrackets {
    config: SeverityConfig,
}

impl MultilineLiteralBrackets {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }
}

impl Rule for MultilineLiteralBrackets {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::Structure(&[StructureKind::Array, StructureKind::Dictionary])
    }

    fn severity(&self) -> Severity {
        self.config.severity
    }

    fn validate_node(&self, ctx: &LintContext, node: &StructureNode) -> Vec<Violation> {
        let Some(body) = node.body_range else {
            return Vec::new();
        };
        let Some(text) = ctx.contents(body) else {
            return Vec::new();
        };
        if !text.contains('\n') {
            return Vec::new();
        }

        let mut violations = Vec::new();
        if !OPENING_NEWLINE.is_match(text) {
            violations.push(Violation::new(
                IDENTIFIER,
                self.severity(),
                body.location,
                "Multiline literal should have its opening bracket followed by a newline",
            ));
        }
        if !CLOSING_NEWLINE.is_match(text) {
            violations.push(Violation::new(
                IDENTIFIER,
                self.severity(),
                body.upper_bound(),
                "Multiline literal should have its closing bracket on a new line",
            ));
        }
        violations
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxProvider;
    use crate::syntax::light::LightSyntax;

    fn offsets(source: &str) -> Vec<usize> {
        let snapshot = LightSyntax.parse(source).unwrap();
        let ctx = LintContext::new(source, &snapshot);
        MultilineLiteralBrackets::default()
            .validate(&ctx)
            .iter()
            .map(|v| v.byte_offset)
            .collect()
    }

    #[test]
    fn test_well_formed_multiline_array() {
        assert!(offsets("let a = [\n  1,\n  2\n]").is_empty());
    }

    #[test]
    fn test_opening_bracket_only() {
        assert_eq!(offsets("let a = [1,\n  2\n]"), vec![9]);
    }

    #[test]
    fn test_both_brackets() {
        assert_eq!(offsets("let a = [1,\n  2]"), vec![9, 15]);
    }

    #[test]
    fn test_trailing_spaces_after_bracket_are_allowed() {
        assert!(offsets("let a = [ \t\n  1\n  ]").is_empty());
    }

    #[test]
    fn test_nested_literals_are_checked_independently() {
        let source = "let a = [\n  [1,\n   2]\n]";
        assert_eq!(offsets(source), vec![13, 20]);
    }
}
