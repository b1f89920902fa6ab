//! Rule self-tests.
//!
//! Every [`RuleDescription`] doubles as a conformance fixture: its examples
//! are parsed through a provider and checked against the owning rule.

use thiserror::Error;

use crate::correction::CorrectionEngine;
use crate::fixture::Example;
use crate::lint_context::LintContext;
use crate::rule::{Rule, Violation};
use crate::syntax::{SyntaxError, SyntaxProvider};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("{rule}: example does not parse ({error}):\n{example}")]
    Syntax {
        rule: &'static str,
        example: String,
        error: SyntaxError,
    },
    #[error("{rule}: expected violations at {expected:?}, found {actual:?}:\n{example}")]
    Offsets {
        rule: &'static str,
        example: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("{rule}: correction produced {actual:?}, expected {expected:?}")]
    Correction {
        rule: &'static str,
        expected: String,
        actual: String,
    },
    #[error("{rule}: corrected text still has violations at {offsets:?}:\n{corrected}")]
    NotConverged {
        rule: &'static str,
        corrected: String,
        offsets: Vec<usize>,
    },
}

struct Verifier<'a> {
    rule: &'a dyn Rule,
    provider: &'a dyn SyntaxProvider,
    failures: Vec<VerificationFailure>,
}

impl Verifier<'_> {
    fn validate(&mut self, text: &str) -> Option<Vec<Violation>> {
        match self.provider.parse(text) {
            Ok(snapshot) => {
                let ctx = LintContext::new(text, &snapshot);
                let mut violations = self.rule.validate(&ctx);
                violations.sort_by_key(|v| v.byte_offset);
                Some(violations)
            }
            Err(error) => {
                self.failures.push(VerificationFailure::Syntax {
                    rule: self.rule.identifier(),
                    example: text.to_string(),
                    error,
                });
                None
            }
        }
    }

    fn check_offsets(&mut self, example: &Example) -> Option<Vec<Violation>> {
        let violations = self.validate(&example.text)?;
        let actual: Vec<usize> = violations.iter().map(|v| v.byte_offset).collect();
        if actual != example.expected_offsets {
            self.failures.push(VerificationFailure::Offsets {
                rule: self.rule.identifier(),
                example: example.text.clone(),
                expected: example.expected_offsets.clone(),
                actual,
            });
        }
        Some(violations)
    }
}

/// Check a rule against its own description.
///
/// - Non-triggering examples must produce no violations.
/// - Triggering examples must produce exactly one violation per marker, at the marker.
/// - Correction examples must produce the expected text, and the corrected
///   text must produce no further violations of the rule.
pub fn verify_rule(rule: &dyn Rule, provider: &dyn SyntaxProvider) -> Result<(), Vec<VerificationFailure>> {
    let description = rule.description();
    let mut verifier = Verifier {
        rule,
        provider,
        failures: Vec::new(),
    };

    for example in description
        .non_triggering_examples
        .iter()
        .chain(&description.triggering_examples)
    {
        verifier.check_offsets(example);
    }

    let engine = CorrectionEngine::new();
    for correction in &description.corrections {
        let Some(violations) = verifier.check_offsets(&correction.before) else {
            continue;
        };
        let corrected = engine.apply(&correction.before.text, &violations).content;
        if corrected != correction.expected {
            verifier.failures.push(VerificationFailure::Correction {
                rule: rule.identifier(),
                expected: correction.expected.clone(),
                actual: corrected.clone(),
            });
        }
        if let Some(remaining) = verifier.validate(&corrected)
            && !remaining.is_empty()
        {
            verifier.failures.push(VerificationFailure::NotConverged {
                rule: rule.identifier(),
                offsets: remaining.iter().map(|v| v.byte_offset).collect(),
                corrected,
            });
        }
    }

    if verifier.failures.is_empty() {
        Ok(())
    } else {
        Err(verifier.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigError};
    use crate::fixture::{corrections, examples};
    use crate::rule::{Correction, RuleCategory, RuleDescription, RuleTrigger};
    use crate::syntax::light::LightSyntax;
    use crate::types::{ByteRange, Severity};
    use std::sync::LazyLock;

    static BROKEN: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
        identifier: "broken",
        name: "Broken",
        explanation: "Flags every `x` and replaces it with `xx`.",
        category: RuleCategory::Lint,
        min_language_version: None,
        is_opt_in: false,
        non_triggering_examples: examples(&["let y = 1", "let x = 1"]),
        triggering_examples: examples(&["let ↓x = 1", "let ↓y = 1"]),
        corrections: corrections(&[("let ↓x = 1", "let xx = 1")]),
    });

    #[derive(Clone)]
    struct Broken;

    impl Rule for Broken {
        fn description(&self) -> &'static RuleDescription {
            &BROKEN
        }

        fn trigger(&self) -> RuleTrigger {
            RuleTrigger::File
        }

        fn validate_file(&self, ctx: &LintContext) -> Vec<Violation> {
            ctx.source
                .match_indices('x')
                .map(|(offset, _)| {
                    Violation::new("broken", Severity::Warning, offset, "x")
                        .with_correction(Correction::new(ByteRange::new(offset, 1), "xx"))
                })
                .collect()
        }

        fn from_config(_config: &Config) -> Result<Box<dyn Rule>, ConfigError> {
            Ok(Box::new(Broken))
        }
    }

    #[test]
    fn test_reports_every_kind_of_failure() {
        let failures = verify_rule(&Broken, &LightSyntax).unwrap_err();
        assert_eq!(failures.len(), 3);
        assert!(matches!(&failures[0], VerificationFailure::Offsets { example, actual, .. }
            if example == "let x = 1" && actual == &vec![4]));
        assert!(matches!(&failures[1], VerificationFailure::Offsets { expected, actual, .. }
            if expected == &vec![4] && actual.is_empty()));
        assert!(matches!(&failures[2], VerificationFailure::NotConverged { offsets, .. } if offsets == &vec![4, 5]));
    }

    #[test]
    fn test_unparsable_example() {
        static UNPARSABLE: LazyLock<RuleDescription> = LazyLock::new(|| RuleDescription {
            non_triggering_examples: examples(&["let s = \"open"]),
            triggering_examples: Vec::new(),
            corrections: Vec::new(),
            ..BROKEN.clone()
        });

        #[derive(Clone)]
        struct Unparsable;

        impl Rule for Unparsable {
            fn description(&self) -> &'static RuleDescription {
                &UNPARSABLE
            }

            fn trigger(&self) -> RuleTrigger {
                RuleTrigger::File
            }

            fn from_config(_config: &Config) -> Result<Box<dyn Rule>, ConfigError> {
                Ok(Box::new(Unparsable))
            }
        }

        let failures = verify_rule(&Unparsable, &LightSyntax).unwrap_err();
        assert!(matches!(
            failures.as_slice(),
            [VerificationFailure::Syntax {
                error: SyntaxError::UnterminatedString { offset: 8 },
                ..
            }]
        ));
    }
}
