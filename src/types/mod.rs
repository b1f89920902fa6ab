//! Core value types shared by the syntax model, rules and configuration.
//!
//! Configuration newtypes validate at deserialization time so that a malformed
//! value is rejected before any file is linted.

mod byte_range;
mod language_version;
mod positive_usize;
mod severity;

pub use byte_range::ByteRange;
pub use language_version::{LanguageVersion, LanguageVersionError};
pub use positive_usize::{PositiveUsize, PositiveUsizeError};
pub use severity::{Severity, SeverityConfig};
