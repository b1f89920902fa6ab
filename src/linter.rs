//! Per-file rule evaluation.
//!
//! A [`Linter`] owns the resolved rule set and a syntax provider. For each
//! file it runs the file rules, then walks the structure tree once in
//! pre-order, invoking every rule registered for a node's kind in
//! registration order. Inline suppression directives are applied last.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::inline_config::InlineConfig;
use crate::lint_context::LintContext;
use crate::registry::{RegistryError, RuleRegistry};
use crate::rule::{LintResult, Rule, RuleTrigger, Violation};
use crate::syntax::light::LightSyntax;
use crate::syntax::{StructureKind, SyntaxError, SyntaxProvider, SyntaxSnapshot};
use crate::types::{LanguageVersion, Severity};
use crate::utils::LineIndex;

/// Failure to build a linter from configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One file to lint. The engine never reads from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A violation with its file position resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedViolation {
    pub rule_identifier: &'static str,
    pub severity: Severity,
    pub path: PathBuf,
    pub byte_offset: usize,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub violations: Vec<ReportedViolation>,
}

impl FileReport {
    /// Resolve positions and order violations by offset. Violations at the
    /// same offset keep their evaluation order.
    pub fn new(path: &Path, source: &str, violations: Vec<Violation>) -> Self {
        let lines = LineIndex::new(source);
        let mut violations: Vec<ReportedViolation> = violations
            .into_iter()
            .map(|violation| {
                let (line, column) = lines.line_col(violation.byte_offset);
                ReportedViolation {
                    rule_identifier: violation.rule_identifier,
                    severity: violation.severity,
                    path: path.to_path_buf(),
                    byte_offset: violation.byte_offset,
                    line,
                    column,
                    reason: violation.reason,
                }
            })
            .collect();
        violations.sort_by_key(|v| v.byte_offset);
        Self {
            path: path.to_path_buf(),
            violations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Linted(FileReport),
    /// The provider could not parse the file; no violations were computed.
    Failed { path: PathBuf, error: SyntaxError },
    Cancelled { path: PathBuf },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Linted(report) => &report.path,
            FileOutcome::Failed { path, .. } | FileOutcome::Cancelled { path } => path,
        }
    }

    pub fn report(&self) -> Option<&FileReport> {
        match self {
            FileOutcome::Linted(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Linter {
    rules: Vec<Box<dyn Rule>>,
    file_rules: Vec<usize>,
    node_rules: HashMap<StructureKind, Vec<usize>>,
    provider: Arc<dyn SyntaxProvider>,
    language_version: LanguageVersion,
}

impl Linter {
    /// A linter running exactly `rules`, in the given order, over the reference provider.
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        let mut file_rules = Vec::new();
        let mut node_rules: HashMap<StructureKind, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            match rule.trigger() {
                RuleTrigger::File => file_rules.push(index),
                RuleTrigger::Structure(kinds) => {
                    for kind in kinds {
                        node_rules.entry(*kind).or_default().push(index);
                    }
                }
            }
        }
        Self {
            rules,
            file_rules,
            node_rules,
            provider: Arc::new(LightSyntax::new()),
            language_version: LanguageVersion::default(),
        }
    }

    /// Resolve the built-in rules against `config`.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let registry = RuleRegistry::builtin()?;
        Ok(Self::with_registry(registry, config)?)
    }

    pub fn with_registry(registry: &RuleRegistry, config: &Config) -> Result<Self, ConfigError> {
        let rules = registry.configure(config)?;
        Ok(Self::new(rules).with_language_version(config.language_version()))
    }

    pub fn with_provider(mut self, provider: Arc<dyn SyntaxProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn provider(&self) -> &dyn SyntaxProvider {
        self.provider.as_ref()
    }

    /// Run every active rule over an already parsed file.
    pub fn lint_snapshot(&self, source: &str, snapshot: &SyntaxSnapshot) -> Vec<Violation> {
        let ctx = LintContext::new(source, snapshot).with_language_version(self.language_version);
        let mut violations = Vec::new();

        for &index in &self.file_rules {
            violations.extend(self.rules[index].validate_file(&ctx));
        }
        for node in snapshot.tree.pre_order() {
            if let Some(indices) = self.node_rules.get(&node.kind) {
                for &index in indices {
                    violations.extend(self.rules[index].validate_node(&ctx, node));
                }
            }
        }

        let inline_config = InlineConfig::from_tokens(source, &snapshot.tokens, &ctx.lines);
        if !inline_config.is_empty() {
            violations.retain(|v| !inline_config.is_rule_disabled(v.rule_identifier, ctx.lines.line_of(v.byte_offset)));
        }
        violations
    }

    pub fn lint_source(&self, source: &str) -> LintResult {
        let snapshot = self.provider.parse(source)?;
        Ok(self.lint_snapshot(source, &snapshot))
    }

    pub fn lint_file(&self, file: &SourceFile) -> FileOutcome {
        let start = Instant::now();
        let outcome = match self.provider.parse(&file.content) {
            Ok(snapshot) => {
                let violations = self.lint_snapshot(&file.content, &snapshot);
                FileOutcome::Linted(FileReport::new(&file.path, &file.content, violations))
            }
            Err(error) => {
                log::debug!("Failed to parse {}: {error}", file.path.display());
                FileOutcome::Failed {
                    path: file.path.clone(),
                    error,
                }
            }
        };
        log::debug!("Linted {} in {:?}", file.path.display(), start.elapsed());
        outcome
    }
}
