use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, ConfigError};
use crate::fixture::examples;
use crate::lint_context::LintContext;
use crate::rule::{Rule, RuleCategory, RuleDescription, RuleTrigger, TokenFilter, Violation};
use crate::rule_config_serde::{RuleConfig, default_config_section, load_rule_config};
use crate::syntax::TokenKind;
use crate::types::{ByteRange, PositiveUsize, Severity};

mod line_length_config;
pub use line_length_config::LineLengthConfig;

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9+.-]*://\S+").unwrap());

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| {
    let at_limit = "/".repeat(120);
    let over_limit = format!("↓let a = \"{}\"", "x".repeat(111));
    let over_limit_second_line = format!("let a = 0\n↓{}", "/".repeat(121));
    RuleDescription {
        identifier: LineLengthConfig::RULE_NAME,
        name: "Line Length",
        explanation: "Lines should not span too many characters.",
        category: RuleCategory::Metrics,
        min_language_version: None,
        is_opt_in: false,
        non_triggering_examples: examples(&[at_limit.as_str(), "let a = 0", "let ç = \"çççç\""]),
        triggering_examples: examples(&[over_limit.as_str(), over_limit_second_line.as_str()]),
        corrections: Vec::new(),
    }
});

/// Flags lines longer than the configured character counts.
#[derive(Debug, Clone, Default)]
pub struct LineLength {
    config: LineLengthConfig,
}

impl LineLength {
    pub fn new(warning: usize, error: usize) -> Self {
        Self {
            config: LineLengthConfig {
                warning: PositiveUsize::new(warning).unwrap_or(LineLengthConfig::default().warning),
                error: PositiveUsize::new(error).unwrap_or(LineLengthConfig::default().error),
                ..Default::default()
            },
        }
    }

    pub const fn from_config_struct(config: LineLengthConfig) -> Self {
        Self { config }
    }

    fn is_comment_only(ctx: &LintContext, line: ByteRange) -> bool {
        TokenFilter::Only(&[TokenKind::Comment]).accepts(ctx.snapshot.tokens.kinds_overlapping(line))
    }
}

impl Rule for LineLength {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::File
    }

    fn validate_file(&self, ctx: &LintContext) -> Vec<Violation> {
        let warning = self.config.warning.get();
        let error = self.config.error.get();
        let mut violations = Vec::new();

        for (_, range, text) in ctx.lines.lines() {
            let length = text.chars().count();
            if length <= warning.min(error) {
                continue;
            }
            if self.config.ignores_comments && Self::is_comment_only(ctx, range) {
                continue;
            }
            if self.config.ignores_urls && URL.is_match(text) {
                continue;
            }

            let (severity, limit) = if length > error {
                (Severity::Error, error)
            } else {
                (Severity::Warning, warning)
            };
            violations.push(Violation::new(
                LineLengthConfig::RULE_NAME,
                severity,
                range.location,
                format!("Line should be {limit} characters or less; currently it has {length} characters"),
            ));
        }

        violations
    }

    fn default_config_section(&self) -> Option<(String, toml::Value)> {
        default_config_section(LineLengthConfig::RULE_NAME, &LineLengthConfig::default())
    }

    fn from_config(config: &Config) -> Result<Box<dyn Rule>, ConfigError>
    where
        Self: Sized,
    {
        let rule_config = load_rule_config::<LineLengthConfig>(config)?;
        Ok(Box::new(Self::from_config_struct(rule_config)))
    }
}

#[cfg(test)]
mod tests;
