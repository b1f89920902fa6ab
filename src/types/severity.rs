use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(serde::de::Error::custom(format!(
                "invalid severity '{other}', expected one of: warning, error"
            ))),
        }
    }
}

/// The minimal configuration every rule accepts: `severity = "warning" | "error"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityConfig {
    #[serde(default)]
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_severities() {
        let config: SeverityConfig = toml::from_str(r#"severity = "error""#).unwrap();
        assert_eq!(config.severity, Severity::Error);

        let config: SeverityConfig = toml::from_str("").unwrap();
        assert_eq!(config.severity, Severity::Warning);
    }

    #[test]
    fn test_reject_unknown_severity() {
        let err = toml::from_str::<SeverityConfig>(r#"severity = "fatal""#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid severity 'fatal'"), "{err}");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: SeverityConfig = toml::from_str("severity = \"error\"\nunknown = 3").unwrap();
        assert_eq!(config.severity, Severity::Error);
    }
}
