mod common;

use proptest::prelude::*;
use sift_lib::correction::CorrectionEngine;
use sift_lib::rule::{Correction, Violation};
use sift_lib::types::{ByteRange, Severity};
use std::collections::BTreeMap;

fn fix(rule: &'static str, location: usize, length: usize, replacement: &str) -> Violation {
    Violation::new(rule, Severity::Warning, location, "test")
        .with_correction(Correction::new(ByteRange::new(location, length), replacement))
}

/// Two corrections where the second starts strictly inside the first.
fn overlapping_pair() -> impl Strategy<Value = (String, (usize, usize), (usize, usize))> {
    ("[a-z]{10,40}", 0usize..4, 2usize..5, 1usize..4, any::<usize>()).prop_map(
        |(source, first_start, first_len, second_len, seed)| {
            let second_start = first_start + 1 + seed % (first_len - 1);
            (source, (first_start, first_len), (second_start, second_len))
        },
    )
}

/// Corrections at pairwise distinct locations inside `source`.
fn corrections_for_source() -> impl Strategy<Value = (String, Vec<(usize, usize, String)>)> {
    "[a-z ,;]{1,60}".prop_flat_map(|source| {
        let len = source.len();
        let correction = (0..=len, 0usize..4, "[A-Z]{0,3}");
        prop::collection::vec(correction, 0..12).prop_map(move |raw| {
            let by_location: BTreeMap<usize, (usize, String)> = raw
                .into_iter()
                .map(|(location, length, replacement)| (location, (length.min(len - location), replacement)))
                .collect();
            let fixes = by_location
                .into_iter()
                .map(|(location, (length, replacement))| (location, length, replacement))
                .collect();
            (source.clone(), fixes)
        })
    })
}

/// Small programs built from lines the reference syntax understands.
fn program() -> impl Strategy<Value = String> {
    let line = prop::sample::select(vec![
        "let a = 1;",
        "let b = [1,2];",
        "foo(a ,b)",
        "foo(a, b);;",
        "// TODO: later",
        "/* FIXME */",
        "let s = \"x ,y;\"",
        "for (_, foo) in bar.enumerated() { }",
        "for (idx, foo) in bar.enumerated() { }",
        "foo { [unowned self] in _ }",
        "let c = [\n  1,\n  2\n]",
        "let d = [1,\n  2]",
        "",
    ]);
    prop::collection::vec(line, 0..20).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn overlapping_corrections_lower_offset_wins((source, (a, la), (b, lb)) in overlapping_pair()) {
        let engine = CorrectionEngine::new();
        let first = fix("first", a, la, "X");
        let second = fix("second", b, lb, "Y");

        let forward = engine.apply(&source, &[first.clone(), second.clone()]);
        let backward = engine.apply(&source, &[second, first]);

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.applied.get("first"), Some(&1));
        prop_assert_eq!(forward.applied.get("second"), None);
        prop_assert_eq!(forward.skipped, 1);
        prop_assert_eq!(forward.content, format!("{}X{}", &source[..a], &source[a + la..]));
    }

    #[test]
    fn input_order_does_not_change_the_outcome((source, fixes) in corrections_for_source()) {
        let violations: Vec<Violation> = fixes
            .iter()
            .map(|(location, length, replacement)| fix("rule", *location, *length, replacement))
            .collect();
        let mut reversed = violations.clone();
        reversed.reverse();

        let engine = CorrectionEngine::new();
        let forward = engine.apply(&source, &violations);
        let backward = engine.apply(&source, &reversed);

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.total_applied() + forward.skipped, violations.len());
    }

    #[test]
    fn linting_generated_programs_is_stable(source in program()) {
        let linter = common::linter_from_toml(
            "[global]\nenable = [\"unowned-variable-capture\", \"multiline-literal-brackets\"]\n",
        );
        let first = linter.lint_source(&source).unwrap();
        let second = linter.lint_source(&source).unwrap();
        prop_assert_eq!(&first, &second);

        let engine = CorrectionEngine::new();
        let corrected = engine.correct_until_stable(&linter, &source, 10).unwrap();
        let remaining = linter.lint_source(&corrected.content).unwrap();
        prop_assert!(remaining.iter().all(|v| !v.is_correctable()), "{:?}", remaining);
    }
}
