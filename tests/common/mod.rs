//! Shared helpers for the integration tests.
#![allow(dead_code)]

use sift_lib::config::Config;
use sift_lib::linter::Linter;
use sift_lib::rule::{Rule, Violation};

/// Build a linter over the built-in rules from a TOML document.
pub fn linter_from_toml(toml: &str) -> Linter {
    let config = Config::from_toml_str(toml).expect("test config should parse");
    Linter::from_config(&config).expect("test config should resolve")
}

/// The built-in rules with the default configuration.
pub fn default_linter() -> Linter {
    linter_from_toml("")
}

/// Run a single rule over `source`.
pub fn lint_with<R: Rule + 'static>(rule: R, source: &str) -> Vec<Violation> {
    Linter::new(vec![Box::new(rule)])
        .lint_source(source)
        .expect("test source should parse")
}

pub fn offsets(violations: &[Violation]) -> Vec<usize> {
    let mut offsets: Vec<usize> = violations.iter().map(|v| v.byte_offset).collect();
    offsets.sort_unstable();
    offsets
}

pub fn identifiers(violations: &[Violation]) -> Vec<&'static str> {
    violations.iter().map(|v| v.rule_identifier).collect()
}
