//! Serde-based configuration for rules
//!
//! Each configurable rule declares a typed options struct. Values arrive as
//! TOML, are bridged to JSON and deserialized with serde, so type errors and
//! validated newtypes (`PositiveUsize`, `Severity`) surface as `ConfigError`s.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, ConfigError};

/// Trait for rule configurations
pub trait RuleConfig: Serialize + DeserializeOwned + Default + Clone {
    /// The rule identifier (e.g., "line-length")
    const RULE_NAME: &'static str;
}

/// Load a typed rule configuration, falling back to defaults when the rule has no table.
pub fn load_rule_config<T: RuleConfig>(config: &Config) -> Result<T, ConfigError> {
    load_rule_config_for(config, T::RULE_NAME)
}

/// Load the options for `rule_name` into any deserializable options type.
pub fn load_rule_config_for<T: DeserializeOwned + Default>(config: &Config, rule_name: &str) -> Result<T, ConfigError> {
    let Some(rule_config) = config.rule(rule_name) else {
        return Ok(T::default());
    };

    let json_map: serde_json::Map<String, serde_json::Value> = rule_config
        .values
        .iter()
        .map(|(k, v)| (k.clone(), toml_value_to_json(v)))
        .collect();

    serde_json::from_value(serde_json::Value::Object(json_map)).map_err(|e| ConfigError::InvalidValue {
        rule: rule_name.to_string(),
        message: e.to_string(),
    })
}

/// Default table for a rule, as reported by `Rule::default_config_section`.
pub fn default_config_section<T: Serialize>(rule_name: &str, config: &T) -> Option<(String, toml::Value)> {
    let json = serde_json::to_value(config).ok()?;
    json_to_toml_value(&json).map(|value| (rule_name.to_string(), value))
}

/// Convert TOML value to JSON value for serde deserialization
fn toml_value_to_json(toml_val: &toml::Value) -> serde_json::Value {
    match toml_val {
        toml::Value::String(s) => serde_json::Value::String(s.clone()),
        toml::Value::Integer(i) => serde_json::Value::Number((*i).into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        toml::Value::Boolean(b) => serde_json::Value::Bool(*b),
        toml::Value::Array(arr) => serde_json::Value::Array(arr.iter().map(toml_value_to_json).collect()),
        toml::Value::Table(table) => {
            let json_map = table.iter().map(|(k, v)| (k.clone(), toml_value_to_json(v))).collect();
            serde_json::Value::Object(json_map)
        }
        // Dates are not meaningful rule options; keep them as text so type errors still surface
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

/// Convert JSON value to TOML value for default config generation
fn json_to_toml_value(json_val: &serde_json::Value) -> Option<toml::Value> {
    match json_val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(toml::Value::Integer(i))
            } else {
                n.as_f64().map(toml::Value::Float)
            }
        }
        serde_json::Value::String(s) => Some(toml::Value::String(s.clone())),
        serde_json::Value::Array(arr) => Some(toml::Value::Array(arr.iter().filter_map(json_to_toml_value).collect())),
        serde_json::Value::Object(obj) => {
            let mut toml_table = toml::map::Map::new();
            for (k, v) in obj {
                if let Some(toml_v) = json_to_toml_value(v) {
                    toml_table.insert(k.clone(), toml_v);
                }
            }
            Some(toml::Value::Table(toml_table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PositiveUsize, Severity, SeverityConfig};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct DemoConfig {
        #[serde(default)]
        severity: Severity,
        #[serde(default = "default_limit")]
        limit: PositiveUsize,
        #[serde(default)]
        skip_comments: bool,
    }

    fn default_limit() -> PositiveUsize {
        PositiveUsize::from_const(10)
    }

    impl Default for DemoConfig {
        fn default() -> Self {
            Self {
                severity: Severity::Warning,
                limit: default_limit(),
                skip_comments: false,
            }
        }
    }

    impl RuleConfig for DemoConfig {
        const RULE_NAME: &'static str = "demo";
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let loaded: DemoConfig = load_rule_config(&Config::default()).unwrap();
        assert_eq!(loaded, DemoConfig::default());
    }

    #[test]
    fn test_values_override_defaults() {
        let config = Config::from_toml_str("[demo]\nseverity = \"error\"\nskip_comments = true\n").unwrap();
        let loaded: DemoConfig = load_rule_config(&config).unwrap();
        assert_eq!(loaded.severity, Severity::Error);
        assert!(loaded.skip_comments);
        assert_eq!(loaded.limit.get(), 10);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        for doc in [
            "[demo]\nseverity = \"fatal\"\n",
            "[demo]\nlimit = 0\n",
            "[demo]\nlimit = \"ten\"\n",
            "[demo]\nskip-comments = 1\n",
        ] {
            let config = Config::from_toml_str(doc).unwrap();
            let err = load_rule_config::<DemoConfig>(&config).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { rule, .. } if rule == "demo"),
                "{doc}: {err:?}"
            );
        }
    }

    #[test]
    fn test_severity_only_rules() {
        let config = Config::from_toml_str("[todo]\nseverity = \"error\"\n").unwrap();
        let loaded: SeverityConfig = load_rule_config_for(&config, "todo").unwrap();
        assert_eq!(loaded.severity, Severity::Error);
    }

    #[test]
    fn test_default_config_section() {
        let (name, value) = default_config_section("demo", &DemoConfig::default()).unwrap();
        assert_eq!(name, "demo");
        let table = value.as_table().unwrap();
        assert_eq!(table.get("limit"), Some(&toml::Value::Integer(10)));
        assert_eq!(table.get("severity"), Some(&toml::Value::String("warning".into())));
    }
}
