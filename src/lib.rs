pub mod config;
pub mod correction;
pub mod fixture;
pub mod inline_config;
pub mod lint_context;
pub mod linter;
pub mod parallel;
pub mod registry;
pub mod rule;
pub mod rule_config_serde;
pub mod rules;
pub mod syntax;
pub mod types;
pub mod utils;
pub mod verification;

pub use rules::*;

pub use crate::config::{Config, ConfigError};
pub use crate::correction::{CorrectionEngine, CorrectionOutcome, IterativeCorrection};
pub use crate::lint_context::LintContext;
pub use crate::linter::{FileOutcome, FileReport, Linter, ReportedViolation, SetupError, SourceFile};
pub use crate::registry::{RegistryError, RuleRegistry};
pub use crate::rule::{Correction, LintError, LintResult, Rule, RuleDescription, Violation};

/// Lint one source text with the reference syntax provider.
/// Assumes the provided `rules` are the final, configured and filtered set
/// to be executed, in evaluation order.
pub fn lint(content: &str, rules: &[Box<dyn Rule>]) -> LintResult {
    Linter::new(rules.to_vec()).lint_source(content)
}
