use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, ConfigError};
use crate::fixture::examples;
use crate::lint_context::LintContext;
use crate::rule::{Rule, RuleCategory, RuleDescription, RuleTrigger, TokenFilter, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::TokenKind;
use crate::types::{ByteRange, Severity, SeverityConfig};

const IDENTIFIER: &str = "todo";

static TODO_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:TODO|FIXME)\b").unwrap());

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Todo",
    explanation: "TODOs and FIXMEs should be resolved.",
    category: RuleCategory::Lint,
    min_language_version: None,
    is_opt_in: false,
    non_triggering_examples: examples(&[
        "// notaTODO:",
        "// notaFIXME:",
        "let TODO = 1",
        "let note = \"TODO: not a comment\"",
    ]),
    triggering_examples: examples(&[
        "// ↓TODO:",
        "// ↓FIXME:",
        "// ↓TODO(note)",
        "// ↓FIXME(note)",
        "/* ↓FIXME */",
        "/* ↓TODO */",
        "/** ↓FIXME */",
        "/// ↓TODO",
        "let a = 1 // ↓TODO: tidy up",
    ]),
    corrections: Vec::new(),
});

/// Flags `TODO` and `FIXME` markers left in comments.
#[derive(Debug, Clone, Default)]
pub struct Todo {
    config: SeverityConfig,
}

impl Todo {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }

    /// The note following a marker, up to the end of its line or comment.
    fn message_after<'a>(source: &'a str, marker: ByteRange) -> &'a str {
        let rest = source.get(marker.upper_bound()..).unwrap_or_default();
        let line = rest.split(['\n', '\r']).next().unwrap_or_default();
        let line = line.split("*/").next().unwrap_or_default();
        line.trim_start_matches([':', ' ', '\t']).trim_end()
    }
}

impl Rule for Todo {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::File
    }

    fn severity(&self) -> Severity {
        self.config.severity
    }

    fn validate_file(&self, ctx: &LintContext) -> Vec<Violation> {
        ctx.match_pattern(&TODO_MARKER, TokenFilter::Only(&[TokenKind::Comment]))
            .into_iter()
            .map(|marker| {
                let kind = ctx.contents(marker).unwrap_or("TODO");
                let message = Self::message_after(ctx.source, marker);
                let reason = if message.is_empty() {
                    format!("{kind}s should be resolved")
                } else {
                    format!("{kind}s should be resolved ({message})")
                };
                Violation::new(IDENTIFIER, self.severity(), marker.location, reason)
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
