mod common;

use common::{default_linter, identifiers, linter_from_toml, offsets};
use pretty_assertions::assert_eq;
use sift_lib::types::Severity;

const OPT_IN: &str = r#"
[global]
enable = ["unowned-variable-capture", "multiline-literal-brackets"]
"#;

#[test]
fn test_unused_index_is_reported_at_the_wildcard() {
    let violations = default_linter()
        .lint_source("for (_, foo) in bar.enumerated() { }")
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_identifier, "unused-enumerated");
    assert_eq!(violations[0].byte_offset, 5);
    assert_eq!(violations[0].severity, Severity::Warning);
    assert_eq!(
        violations[0].reason,
        "When the index is not used, `.enumerated()` can be removed."
    );
}

#[test]
fn test_used_index_is_clean() {
    let violations = default_linter()
        .lint_source("for (idx, foo) in bar.enumerated() { }")
        .unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_unowned_capture_is_reported_when_enabled() {
    let source = "foo { [unowned self] in _ }";
    assert!(default_linter().lint_source(source).unwrap().is_empty());

    let violations = linter_from_toml(OPT_IN).lint_source(source).unwrap();
    assert_eq!(identifiers(&violations), vec!["unowned-variable-capture"]);
    assert_eq!(offsets(&violations), vec![7]);
}

#[test]
fn test_weak_capture_is_clean() {
    let violations = linter_from_toml(OPT_IN)
        .lint_source("foo { [weak self] in _ }")
        .unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_multiline_literal_with_brackets_on_own_lines_is_clean() {
    let violations = linter_from_toml(OPT_IN)
        .lint_source("let a = [\n  1,\n  2\n]")
        .unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_multiline_literal_opening_on_first_element() {
    let violations = linter_from_toml(OPT_IN)
        .lint_source("let a = [1,\n  2\n]")
        .unwrap();
    assert_eq!(identifiers(&violations), vec!["multiline-literal-brackets"]);
    assert_eq!(offsets(&violations), vec![9]);
    assert_eq!(
        violations[0].reason,
        "Multiline literal should have its opening bracket followed by a newline"
    );
}

#[test]
fn test_linting_is_idempotent() {
    let source = "\
// TODO: split this file
for (_, foo) in bar.enumerated() { }
let a = [1,2];
foo { [unowned self] in _ }
let b = [1,
  2]
";
    let linter = linter_from_toml(OPT_IN);
    let first = linter.lint_source(source).unwrap();
    let second = linter.lint_source(source).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_both_bracket_boundaries_are_reported() {
    let source = "let a = [1,\n  2]";
    let violations = linter_from_toml(OPT_IN).lint_source(source).unwrap();
    assert_eq!(identifiers(&violations), vec!["multiline-literal-brackets", "multiline-literal-brackets"]);
    assert_eq!(offsets(&violations), vec![9, 15]);
}
