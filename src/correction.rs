//! Applying corrections.
//!
//! Corrections for one file are accepted in order of location, first come
//! first served: a correction whose range intersects an already accepted one,
//! or starts at the same location, is skipped. Accepted corrections are
//! applied from the end of the buffer towards the start so earlier offsets
//! stay valid.

use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::linter::Linter;
use crate::rule::{Correction, LintError, Violation};

/// Result of applying one batch of corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub content: String,
    /// Applied corrections per rule identifier
    pub applied: BTreeMap<String, usize>,
    /// Corrections dropped for conflicting or invalid ranges
    pub skipped: usize,
}

impl CorrectionOutcome {
    pub fn total_applied(&self) -> usize {
        self.applied.values().sum()
    }
}

/// Result of correcting a file until no correctable violation remains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterativeCorrection {
    pub content: String,
    pub applied: BTreeMap<String, usize>,
    pub skipped: usize,
    /// Correction passes that changed the content
    pub iterations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CorrectionEngine {
    unfixable: HashSet<String>,
}

impl CorrectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never apply corrections of the given rules.
    pub fn with_unfixable<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unfixable.extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().with_unfixable(config.global.unfixable.iter().cloned())
    }

    pub fn is_fixable(&self, rule_identifier: &str) -> bool {
        !self.unfixable.contains(rule_identifier)
    }

    /// Apply the corrections carried by `violations` to `source`.
    pub fn apply(&self, source: &str, violations: &[Violation]) -> CorrectionOutcome {
        let mut candidates: Vec<(&'static str, &Correction)> = violations
            .iter()
            .filter(|v| self.is_fixable(v.rule_identifier))
            .filter_map(|v| v.correction.as_ref().map(|c| (v.rule_identifier, c)))
            .collect();
        // Stable: equal locations keep input order
        candidates.sort_by_key(|(_, correction)| correction.range.location);

        let mut skipped = 0;
        let mut accepted: Vec<(&'static str, &Correction)> = Vec::with_capacity(candidates.len());
        for (rule, correction) in candidates {
            let valid = correction.range.slice(source).is_some();
            let conflicts = accepted.iter().any(|(_, a)| {
                a.range.location == correction.range.location || a.range.intersects(&correction.range)
            });
            if valid && !conflicts {
                accepted.push((rule, correction));
            } else {
                skipped += 1;
            }
        }

        accepted.sort_by(|(_, a), (_, b)| b.range.location.cmp(&a.range.location));

        let mut content = source.to_string();
        let mut applied = BTreeMap::new();
        for (rule, correction) in accepted {
            content.replace_range(correction.range.as_range(), &correction.replacement);
            *applied.entry(rule.to_string()).or_insert(0) += 1;
        }

        CorrectionOutcome {
            content,
            applied,
            skipped,
        }
    }

    /// Lint and correct repeatedly until no fixable violation remains, a pass
    /// changes nothing, or `max_iterations` passes have run.
    pub fn correct_until_stable(
        &self,
        linter: &Linter,
        source: &str,
        max_iterations: usize,
    ) -> Result<IterativeCorrection, LintError> {
        let mut result = IterativeCorrection {
            content: source.to_string(),
            ..Default::default()
        };

        while result.iterations < max_iterations {
            let violations = linter.lint_source(&result.content)?;
            if !violations
                .iter()
                .any(|v| v.is_correctable() && self.is_fixable(v.rule_identifier))
            {
                break;
            }

            let outcome = self.apply(&result.content, &violations);
            if outcome.content == result.content {
                break;
            }
            result.iterations += 1;
            result.skipped += outcome.skipped;
            for (rule, count) in outcome.applied {
                *result.applied.entry(rule).or_insert(0) += count;
            }
            result.content = outcome.content;
        }

        if result.iterations == max_iterations && max_iterations > 0 {
            log::debug!("Corrections did not settle after {max_iterations} passes");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CommaSpacing, TrailingSemicolon};
    use crate::types::{ByteRange, Severity};
    use pretty_assertions::assert_eq;

    fn fix(rule: &'static str, location: usize, length: usize, replacement: &str) -> Violation {
        Violation::new(rule, Severity::Warning, location, "test")
            .with_correction(Correction::new(ByteRange::new(location, length), replacement))
    }

    #[test]
    fn test_applies_from_the_end() {
        let outcome = CorrectionEngine::new().apply(
            "let a = 1;\nlet b = 2;\n",
            &[fix("semi", 9, 1, ""), fix("semi", 20, 1, "")],
        );
        assert_eq!(outcome.content, "let a = 1\nlet b = 2\n");
        assert_eq!(outcome.applied.get("semi"), Some(&2));
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_overlap_lower_offset_wins() {
        let source = "abcdef";
        let first = fix("a", 1, 3, "X");
        let second = fix("b", 2, 3, "Y");
        for violations in [vec![first.clone(), second.clone()], vec![second, first]] {
            let outcome = CorrectionEngine::new().apply(source, &violations);
            assert_eq!(outcome.content, "aXef");
            assert_eq!(outcome.skipped, 1);
            assert_eq!(outcome.applied.get("a"), Some(&1));
            assert_eq!(outcome.applied.get("b"), None);
        }
    }

    #[test]
    fn test_adjacent_ranges_do_not_conflict() {
        let outcome = CorrectionEngine::new().apply("abcd", &[fix("r", 2, 2, "Y"), fix("r", 0, 2, "X")]);
        assert_eq!(outcome.content, "XY");
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_insertions_at_same_offset_conflict() {
        let outcome = CorrectionEngine::new().apply("ab", &[fix("r", 1, 0, "X"), fix("s", 1, 0, "Y")]);
        assert_eq!(outcome.content, "aXb");
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_same_location_keeps_input_order() {
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("abc", &[fix("r", 1, 1, "B"), fix("s", 1, 0, "_")]);
        assert_eq!(outcome.content, "aBc");
        assert_eq!(outcome.skipped, 1);

        let outcome = engine.apply("abc", &[fix("s", 1, 0, "_"), fix("r", 1, 1, "B")]);
        assert_eq!(outcome.content, "a_bc");
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_invalid_ranges_are_skipped() {
        let outcome = CorrectionEngine::new().apply("ç;", &[fix("r", 1, 1, ""), fix("r", 2, 5, ""), fix("r", 2, 1, "")]);
        assert_eq!(outcome.content, "ç");
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_overflowing_range_is_skipped() {
        let outcome = CorrectionEngine::new().apply("abc", &[fix("r", 1, usize::MAX, ""), fix("r", 2, 1, "C")]);
        assert_eq!(outcome.content, "abC");
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_unfixable_rules_are_left_alone() {
        let engine = CorrectionEngine::new().with_unfixable(["semi"]);
        let outcome = engine.apply("a;", &[fix("semi", 1, 1, "")]);
        assert_eq!(outcome.content, "a;");
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_correct_until_stable() {
        let linter = Linter::new(vec![Box::new(TrailingSemicolon::default()), Box::new(CommaSpacing::default())]);
        let result = CorrectionEngine::new()
            .correct_until_stable(&linter, "foo(a ,b);\nbar(1,2,3);;\n", 10)
            .unwrap();
        assert_eq!(result.content, "foo(a, b)\nbar(1, 2, 3)\n");
        assert_eq!(result.applied.get("trailing-semicolon"), Some(&2));
        assert_eq!(result.applied.get("comma-spacing"), Some(&3));
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_correct_until_stable_honors_max_iterations() {
        let linter = Linter::new(vec![Box::new(TrailingSemicolon::default())]);
        let result = CorrectionEngine::new().correct_until_stable(&linter, "a;\n", 0).unwrap();
        assert_eq!(result.content, "a;\n");
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_from_config_reads_unfixable() {
        let config = Config::from_toml_str("[global]\nunfixable = [\"comma-spacing\"]\n").unwrap();
        let engine = CorrectionEngine::from_config(&config);
        assert!(!engine.is_fixable("comma-spacing"));
        assert!(engine.is_fixable("trailing-semicolon"));
    }
}
