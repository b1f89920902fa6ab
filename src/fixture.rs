//! Structured rule examples.
//!
//! Examples are written as source text with `↓` placed immediately before
//! each position where a violation is expected. The markers are stripped
//! once, when the owning description is built.

use serde::Serialize;

pub const VIOLATION_MARKER: char = '↓';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub text: String,
    /// Byte offsets of the stripped markers, in the stripped text.
    pub expected_offsets: Vec<usize>,
}

impl Example {
    pub fn parse(marked: &str) -> Self {
        let mut text = String::with_capacity(marked.len());
        let mut expected_offsets = Vec::new();
        for c in marked.chars() {
            if c == VIOLATION_MARKER {
                expected_offsets.push(text.len());
            } else {
                text.push(c);
            }
        }
        Self { text, expected_offsets }
    }
}

/// A correction fixture: applying the rule's corrections to `before`
/// must produce `expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionExample {
    pub before: Example,
    pub expected: String,
}

pub fn examples(marked: &[&str]) -> Vec<Example> {
    marked.iter().map(|m| Example::parse(m)).collect()
}

pub fn corrections(pairs: &[(&str, &str)]) -> Vec<CorrectionExample> {
    pairs
        .iter()
        .map(|(before, expected)| CorrectionExample {
            before: Example::parse(before),
            expected: (*expected).to_string(),
        })
        .collect()
}
