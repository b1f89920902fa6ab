//! This module defines the Rule trait and the types rules exchange with the linter:
//! descriptions, triggers, violations and corrections.

use dyn_clone::DynClone;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::fixture::{CorrectionExample, Example};
use crate::lint_context::LintContext;
use crate::syntax::{StructureKind, StructureNode, SyntaxError, TokenKind};
use crate::types::{ByteRange, LanguageVersion, Severity};

#[derive(Debug, Error)]
pub enum LintError {
    #[error("Parsing error: {0}")]
    Syntax(#[from] SyntaxError),
}

pub type LintResult = Result<Vec<Violation>, LintError>;

/// Grouping used in listings and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Lint,
    Idiomatic,
    Style,
    Metrics,
}

impl RuleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Lint => "lint",
            RuleCategory::Idiomatic => "idiomatic",
            RuleCategory::Style => "style",
            RuleCategory::Metrics => "metrics",
        }
    }
}

/// What a rule scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTrigger {
    /// Once per file, before the structure walk.
    File,
    /// Once per node of one of the listed kinds.
    Structure(&'static [StructureKind]),
}

/// Lexical filter applied to pattern matches in file rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFilter {
    /// Drop matches overlapping any token of these kinds.
    Excluding(&'static [TokenKind]),
    /// Keep matches that overlap at least one token and only tokens of these kinds.
    Only(&'static [TokenKind]),
}

impl TokenFilter {
    pub fn accepts(&self, mut overlapping: impl Iterator<Item = TokenKind>) -> bool {
        match self {
            TokenFilter::Excluding(kinds) => !overlapping.any(|kind| kinds.contains(&kind)),
            TokenFilter::Only(kinds) => {
                let mut seen = false;
                for kind in overlapping {
                    if !kinds.contains(&kind) {
                        return false;
                    }
                    seen = true;
                }
                seen
            }
        }
    }
}

/// Static metadata and conformance examples for one rule.
#[derive(Debug, Clone)]
pub struct RuleDescription {
    /// Stable kebab-case identifier used in configuration and directives.
    pub identifier: &'static str,
    pub name: &'static str,
    pub explanation: &'static str,
    pub category: RuleCategory,
    pub min_language_version: Option<LanguageVersion>,
    pub is_opt_in: bool,
    pub non_triggering_examples: Vec<Example>,
    pub triggering_examples: Vec<Example>,
    pub corrections: Vec<CorrectionExample>,
}

/// A text edit attached to one violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub range: ByteRange,
    pub replacement: String,
}

impl Correction {
    pub fn new(range: ByteRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn deletion(range: ByteRange) -> Self {
        Self::new(range, "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule_identifier: &'static str,
    pub severity: Severity,
    pub byte_offset: usize,
    pub reason: String,
    pub correction: Option<Correction>,
}

impl Violation {
    pub fn new(rule_identifier: &'static str, severity: Severity, byte_offset: usize, reason: impl Into<String>) -> Self {
        Self {
            rule_identifier,
            severity,
            byte_offset,
            reason: reason.into(),
            correction: None,
        }
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn is_correctable(&self) -> bool {
        self.correction.is_some()
    }
}

pub trait Rule: DynClone + Send + Sync {
    fn description(&self) -> &'static RuleDescription;

    fn trigger(&self) -> RuleTrigger;

    fn identifier(&self) -> &'static str {
        self.description().identifier
    }

    /// Severity assigned to violations without a rule-specific override.
    fn severity(&self) -> Severity {
        Severity::Warning
    }

    /// Called once per file for [`RuleTrigger::File`] rules.
    fn validate_file(&self, _ctx: &LintContext) -> Vec<Violation> {
        Vec::new()
    }

    /// Called once per matching node for [`RuleTrigger::Structure`] rules.
    fn validate_node(&self, _ctx: &LintContext, _node: &StructureNode) -> Vec<Violation> {
        Vec::new()
    }

    /// Run this rule alone over a whole file, honoring its trigger.
    fn validate(&self, ctx: &LintContext) -> Vec<Violation> {
        match self.trigger() {
            RuleTrigger::File => self.validate_file(ctx),
            RuleTrigger::Structure(kinds) => ctx
                .snapshot
                .tree
                .pre_order()
                .filter(|node| kinds.contains(&node.kind))
                .flat_map(|node| self.validate_node(ctx, node))
                .collect(),
        }
    }

    /// Whether violations of this rule carry corrections.
    fn is_correctable(&self) -> bool {
        false
    }

    /// Returns the rule identifier and default config table if the rule has config.
    fn default_config_section(&self) -> Option<(String, toml::Value)> {
        None
    }

    /// Factory: create a rule from config (if present), or use defaults.
    fn from_config(config: &Config) -> Result<Box<dyn Rule>, ConfigError>
    where
        Self: Sized;
}

// Implement the cloning logic for the Rule trait object
dyn_clone::clone_trait_object!(Rule);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_filter_excluding() {
        let filter = TokenFilter::Excluding(&[TokenKind::Comment, TokenKind::String]);
        assert!(filter.accepts(std::iter::empty()));
        assert!(filter.accepts([TokenKind::Identifier].into_iter()));
        assert!(!filter.accepts([TokenKind::Identifier, TokenKind::String].into_iter()));
    }

    #[test]
    fn test_token_filter_only() {
        let filter = TokenFilter::Only(&[TokenKind::Comment]);
        assert!(!filter.accepts(std::iter::empty()));
        assert!(filter.accepts([TokenKind::Comment].into_iter()));
        assert!(!filter.accepts([TokenKind::Comment, TokenKind::Keyword].into_iter()));
    }

    #[test]
    fn test_violation_correctable() {
        let violation = Violation::new("demo", Severity::Warning, 3, "reason");
        assert!(!violation.is_correctable());
        let fixed = violation.with_correction(Correction::deletion(ByteRange::new(3, 1)));
        assert!(fixed.is_correctable());
        assert_eq!(fixed.correction.unwrap().replacement, "");
    }
}
