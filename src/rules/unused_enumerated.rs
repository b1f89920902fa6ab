use std::sync::LazyLock;

use crate::config::{Config, ConfigError};
use crate::fixture::examples;
use crate::lint_context::LintContext;
use crate::rule::{Rule, RuleCategory, RuleDescription, RuleTrigger, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::{ElementKind, StructureKind, StructureNode, Token, TokenKind};
use crate::types::{Severity, SeverityConfig};

const IDENTIFIER: &str = "unused-enumerated";

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Unused Enumerated",
    explanation: "When the index or the item is not used, `.enumerated()` can be removed.",
    category: RuleCategory::Idiomatic,
    min_language_version: None,
    is_opt_in: false,
    non_triggering_examples: examples(&[
        "for (idx, foo) in bar.enumerated() { }",
        "for (_, foo) in bar.enumerated().something() { }",
        "for (_, foo) in bar.something() { }",
        "for foo in bar.enumerated() { }",
        "for foo in bar { }",
        "for (idx, _) in bar.enumerateSomething() { }",
        "for (_, _) in bar.enumerated() { }",
        "for (a, b, _) in bar.enumerated() { }",
        "for (idx, _) in bar.enumerated().something() { }",
        "for (idx, _) in bar.something() { }",
        "for idx in bar.indices { }",
        "for (section, (event, _)) in data.enumerated() {}",
    ]),
    triggering_examples: examples(&[
        "for (↓_, foo) in bar.enumerated() { }",
        "for (↓_, foo) in abc.bar.enumerated() { }",
        "for (↓_, foo) in abc.something().enumerated() { }",
        "for (idx, ↓_) in bar.enumerated() { }",
        "for (↓_, foo) in bar.enumerated() { }\n",
        "for (idx, ↓_) in bar.enumerated() { }\n",
    ]),
    corrections: Vec::new(),
});

/// Flags `for (_, item) in xs.enumerated()` and `for (index, _) in xs.enumerated()`.
#[derive(Debug, Clone, Default)]
pub struct UnusedEnumerated {
    config: SeverityConfig,
}

impl UnusedEnumerated {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }

    fn is_enumerated_call(node: &StructureNode) -> bool {
        node.kind == StructureKind::Call && node.name.as_deref().is_some_and(|name| name.ends_with(".enumerated"))
    }

    fn is_discarded(ctx: &LintContext, token: &Token) -> bool {
        token.kind == TokenKind::Keyword && token.range.length == 1 && token.text(ctx.source) == Some("_")
    }
}

impl Rule for UnusedEnumerated {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::Structure(&[StructureKind::ForEach])
    }

    fn severity(&self) -> Severity {
        self.config.severity
    }

    fn validate_node(&self, ctx: &LintContext, node: &StructureNode) -> Vec<Violation> {
        if !node.substructure.iter().any(Self::is_enumerated_call) {
            return Vec::new();
        }
        let Some(pattern) = node.element_range(ElementKind::Id) else {
            return Vec::new();
        };
        let [first, last] = ctx.tokens_in(pattern) else {
            return Vec::new();
        };

        let (token, reason) = match (Self::is_discarded(ctx, first), Self::is_discarded(ctx, last)) {
            (true, false) => (first, "When the index is not used, `.enumerated()` can be removed."),
            (false, true) => (
                last,
                "When the item is not used, `.indices` should be used instead of `.enumerated()`.",
            ),
            _ => return Vec::new(),
        };
        vec![Violation::new(IDENTIFIER, self.severity(), token.range.location, reason)]
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
