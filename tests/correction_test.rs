mod common;

use common::{default_linter, lint_with, linter_from_toml};
use pretty_assertions::assert_eq;
use sift_lib::config::Config;
use sift_lib::correction::CorrectionEngine;
use sift_lib::registry::RuleRegistry;
use sift_lib::rules::{CommaSpacing, TrailingSemicolon};

#[test]
fn test_correctable_rules_converge_on_their_triggering_examples() {
    let registry = RuleRegistry::builtin().unwrap();
    let engine = CorrectionEngine::new();
    for id in registry.identifiers() {
        let rule = registry.get(id).unwrap();
        if !rule.is_correctable() {
            continue;
        }
        let linter = sift_lib::Linter::new(vec![dyn_clone::clone_box(rule)]);
        for example in &rule.description().triggering_examples {
            let violations = linter.lint_source(&example.text).unwrap();
            let outcome = engine.apply(&example.text, &violations);
            assert_eq!(outcome.skipped, 0, "{id}: {:?}", example.text);
            let remaining = linter.lint_source(&outcome.content).unwrap();
            assert!(
                remaining.is_empty(),
                "{id}: {:?} corrected to {:?} still has {remaining:?}",
                example.text,
                outcome.content
            );
        }
    }
}

#[test]
fn test_correct_file_with_several_rules() {
    let source = "let a = [1 ,2];\nfoo(x,y);\n";
    let result = CorrectionEngine::new()
        .correct_until_stable(&default_linter(), source, 10)
        .unwrap();
    assert_eq!(result.content, "let a = [1, 2]\nfoo(x, y)\n");
    assert_eq!(result.applied.get("comma-spacing"), Some(&2));
    assert_eq!(result.applied.get("trailing-semicolon"), Some(&2));
    assert_eq!(result.skipped, 0);
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_uncorrectable_violations_stay_reported() {
    let source = "// TODO: tidy;\nfor (_, foo) in bar.enumerated() { };\n";
    let linter = default_linter();
    let result = CorrectionEngine::new().correct_until_stable(&linter, source, 10).unwrap();
    assert_eq!(result.content, "// TODO: tidy;\nfor (_, foo) in bar.enumerated() { }\n");

    let remaining: Vec<&str> = linter
        .lint_source(&result.content)
        .unwrap()
        .iter()
        .map(|v| v.rule_identifier)
        .collect();
    assert_eq!(remaining, vec!["todo", "unused-enumerated"]);
}

#[test]
fn test_unfixable_rules_from_config() {
    let toml = "[global]\nunfixable = [\"trailing-semicolon\"]\n";
    let config = Config::from_toml_str(toml).unwrap();
    let result = CorrectionEngine::from_config(&config)
        .correct_until_stable(&linter_from_toml(toml), "foo(x,y);\n", 10)
        .unwrap();
    assert_eq!(result.content, "foo(x, y);\n");
    assert_eq!(result.applied.get("trailing-semicolon"), None);
    assert_eq!(result.applied.get("comma-spacing"), Some(&1));
}

#[test]
fn test_correcting_clean_source_is_a_no_op() {
    let source = "let a = [1, 2]\nfoo(x, y)\n";
    let result = CorrectionEngine::new()
        .correct_until_stable(&default_linter(), source, 10)
        .unwrap();
    assert_eq!(result.content, source);
    assert_eq!(result.iterations, 0);
    assert!(result.applied.is_empty());
}

#[test]
fn test_corrections_inside_strings_and_comments_are_never_produced() {
    let source = "let s = \"a ,b;\"\n// x ,y;\n";
    assert!(lint_with(CommaSpacing::default(), source).is_empty());
    assert!(lint_with(TrailingSemicolon::default(), source).is_empty());
}

#[test]
fn test_correction_offsets_survive_multibyte_text() {
    let source = "let ç = \"é\";\nfoo(ü,ö);\n";
    let result = CorrectionEngine::new()
        .correct_until_stable(&default_linter(), source, 10)
        .unwrap();
    assert_eq!(result.content, "let ç = \"é\"\nfoo(ü, ö)\n");
}
