use std::sync::LazyLock;

use crate::config::{Config, ConfigError};
use crate::fixture::examples;
use crate::lint_context::LintContext;
use crate::rule::{Rule, RuleCategory, RuleDescription, RuleTrigger, Violation};
use crate::rule_config_serde::{default_config_section, load_rule_config_for};
use crate::syntax::{AttributeKind, StructureKind, StructureNode, TokenKind};
use crate::types::{ByteRange, LanguageVersion, Severity, SeverityConfig};

const IDENTIFIER: &str = "unowned-variable-capture";

static DESCRIPTION: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Unowned Variable Capture",
    explanation: "Prefer capturing references as weak to avoid potential crashes.",
    category: RuleCategory::Lint,
    min_language_version: Some(LanguageVersion::FIVE),
    is_opt_in: true,
    non_triggering_examples: examples(&[
        "foo { [weak self] in _ }",
        "foo { [weak self] param in _ }",
        "foo { [weak bar] in _ }",
        "foo { [weak bar] param in _ }",
        "foo { bar in _ }",
        "foo { $0 }",
        "final class First {}\nfinal class Second {\n    unowned var value: First\n    init(value: First) {\n        self.value = value\n    }\n}",
    ]),
    triggering_examples: examples(&[
        "foo { [↓unowned self] in _ }",
        "foo { [↓unowned bar] in _ }",
        "foo { [bar, ↓unowned self] in _ }",
    ]),
    corrections: Vec::new(),
});

/// Flags `unowned` entries in closure capture lists.
#[derive(Debug, Clone, Default)]
pub struct UnownedVariableCapture {
    config: SeverityConfig,
}

impl UnownedVariableCapture {
    pub const fn from_config_struct(config: SeverityConfig) -> Self {
        Self { config }
    }

    /// Range between the opening brace and the closure's `in` keyword.
    fn capture_list_range(ctx: &LintContext, body: ByteRange) -> Option<ByteRange> {
        let in_keyword = ctx
            .tokens_in(body)
            .iter()
            .find(|token| token.kind == TokenKind::Keyword && token.text(ctx.source) == Some("in"))?;
        Some(ByteRange::from_bounds(body.location, in_keyword.range.location))
    }
}

impl Rule for UnownedVariableCapture {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn trigger(&self) -> RuleTrigger {
        RuleTrigger::Structure(&[StructureKind::Closure])
    }

    fn severity(&self) -> Severity {
        self.config.severity
    }

    fn validate_node(&self, ctx: &LintContext, node: &StructureNode) -> Vec<Violation> {
        let Some(body) = node.body_range else {
            return Vec::new();
        };
        let Some(captures) = Self::capture_list_range(ctx, body) else {
            return Vec::new();
        };

        // `weak` and `unowned` share one attribute kind; only the text tells them apart
        ctx.snapshot
            .tree
            .breadth_first()
            .filter(|decl| decl.kind == StructureKind::VarLocal && captures.contains_range(&decl.range))
            .filter_map(|decl| {
                decl.attributes
                    .iter()
                    .find(|attr| attr.kind == AttributeKind::Weak && ctx.contents(attr.range) == Some("unowned"))
            })
            .map(|attr| {
                Violation::new(
                    IDENTIFIER,
                    self.severity(),
                    attr.range.location,
                    "Prefer capturing references as weak to avoid potential crashes",
                )
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
