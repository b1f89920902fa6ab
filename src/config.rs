//! This module defines configuration structures and in-memory loading for sift.
//! Configuration arrives as a TOML document or table: a `[global]` table plus
//! one table per rule identifier.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::LanguageVersion;

/// Normalizes configuration keys (rule identifiers, option names) to lowercase kebab-case.
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('_', "-").to_ascii_lowercase()
}

/// Represents a rule-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RuleConfig {
    /// Configuration values for the rule
    #[serde(flatten)]
    pub values: BTreeMap<String, toml::Value>,
}

/// Represents the complete configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Global configuration options
    #[serde(default)]
    pub global: GlobalConfig,

    /// Rule-specific configurations
    #[serde(flatten)]
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Global configuration options
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Opt-in rules to enable
    pub enable: Vec<String>,

    /// Rules to disable
    pub disable: Vec<String>,

    /// When non-empty, the only rules that run
    pub only: Vec<String>,

    /// Rules whose corrections are never applied
    pub unfixable: Vec<String>,

    /// Language version of the sources being linted
    #[serde(alias = "language_version", skip_serializing_if = "Option::is_none")]
    pub language_version: Option<LanguageVersion>,
}

/// Errors that can occur when loading configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse the configuration content
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// A recognized option has a value of the wrong type or out of range
    #[error("Invalid configuration for rule '{rule}': {message}")]
    InvalidValue { rule: String, message: String },
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {e}")))?;
        Self::from_table(table)
    }

    /// Build a configuration from an already parsed TOML table.
    pub fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
        let config: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Lowercase kebab-case rule identifiers and option keys, both in rule
    /// tables and in the global rule lists.
    fn normalized(self) -> Self {
        let rules = self
            .rules
            .into_iter()
            .map(|(name, rule)| {
                let values = rule.values.into_iter().map(|(k, v)| (normalize_key(&k), v)).collect();
                (normalize_key(&name), RuleConfig { values })
            })
            .collect();
        let normalize_all =
            |ids: Vec<String>| -> Vec<String> { ids.iter().map(|id| normalize_key(id)).collect() };
        let global = GlobalConfig {
            enable: normalize_all(self.global.enable),
            disable: normalize_all(self.global.disable),
            only: normalize_all(self.global.only),
            unfixable: normalize_all(self.global.unfixable),
            language_version: self.global.language_version,
        };
        Config { global, rules }
    }

    pub fn language_version(&self) -> LanguageVersion {
        self.global.language_version.unwrap_or_default()
    }

    pub fn rule(&self, identifier: &str) -> Option<&RuleConfig> {
        self.rules.get(identifier)
    }

    /// Rule identifiers mentioned anywhere in this configuration that are not in `known`.
    pub fn unknown_rule_identifiers(&self, known: &BTreeSet<&str>) -> Vec<String> {
        let mentioned = self.rules.keys().chain(
            self.global
                .enable
                .iter()
                .chain(&self.global.disable)
                .chain(&self.global.only)
                .chain(&self.global.unfixable),
        );
        let unknown: BTreeSet<&String> = mentioned
            .filter(|id| id.as_str() != "all" && !known.contains(id.as_str()))
            .collect();
        unknown.into_iter().cloned().collect()
    }
}
