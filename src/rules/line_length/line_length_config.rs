use crate::rule_config_serde::RuleConfig;
use crate::types::PositiveUsize;
use serde::{Deserialize, Serialize};

/// Configuration for line-length
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LineLengthConfig {
    /// Lines longer than this many characters warn (default: 120)
    #[serde(default = "default_warning")]
    pub warning: PositiveUsize,

    /// Lines longer than this many characters are errors (default: 200)
    #[serde(default = "default_error")]
    pub error: PositiveUsize,

    /// Skip lines holding only a comment (default: false)
    #[serde(default, alias = "ignores_comments")]
    pub ignores_comments: bool,

    /// Skip lines containing a URL (default: false)
    #[serde(default, alias = "ignores_urls")]
    pub ignores_urls: bool,
}

fn default_warning() -> PositiveUsize {
    PositiveUsize::from_const(120)
}

fn default_error() -> PositiveUsize {
    PositiveUsize::from_const(200)
}

impl Default for LineLengthConfig {
    fn default() -> Self {
        Self {
            warning: default_warning(),
            error: default_error(),
            ignores_comments: false,
            ignores_urls: false,
        }
    }
}

impl RuleConfig for LineLengthConfig {
    const RULE_NAME: &'static str = "line-length";
}
