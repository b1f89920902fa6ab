//! The set of known rules.
//!
//! A registry keeps one default instance per rule, for its description and
//! default options, plus the factory that builds a configured instance.
//! The built-in registry is assembled once and only read afterwards.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::rule::{Rule, RuleDescription};
use crate::rules::{filter_rules, register_builtin};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("rule identifier '{0}' is registered more than once")]
    DuplicateIdentifier(String),
}

type RuleFactory = fn(&Config) -> Result<Box<dyn Rule>, ConfigError>;

#[derive(Clone)]
struct RegisteredRule {
    default: Box<dyn Rule>,
    factory: RuleFactory,
}

#[derive(Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<RegisteredRule>,
}

static BUILTIN: LazyLock<Result<RuleRegistry, RegistryError>> = LazyLock::new(|| {
    let mut registry = RuleRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
});

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in rule, in evaluation order.
    pub fn builtin() -> Result<&'static RuleRegistry, RegistryError> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    /// Add a rule type. Its identifier must not be registered yet.
    pub fn register<R: Rule + Default + 'static>(&mut self) -> Result<(), RegistryError> {
        let rule = R::default();
        let identifier = rule.identifier();
        if self.get(identifier).is_some() {
            return Err(RegistryError::DuplicateIdentifier(identifier.to_string()));
        }
        self.entries.push(RegisteredRule {
            default: Box::new(rule),
            factory: R::from_config,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The default instance of a rule.
    pub fn get(&self, identifier: &str) -> Option<&dyn Rule> {
        self.entries
            .iter()
            .find(|entry| entry.default.identifier() == identifier)
            .map(|entry| entry.default.as_ref())
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.default.identifier())
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &'static RuleDescription> + '_ {
        self.entries.iter().map(|entry| entry.default.description())
    }

    /// Default option tables of every configurable rule, keyed by identifier.
    pub fn default_config(&self) -> toml::Table {
        self.entries
            .iter()
            .filter_map(|entry| entry.default.default_config_section())
            .collect()
    }

    /// Build every registered rule from `config`, whether or not it will run.
    ///
    /// A malformed option is an error even for a rule that ends up disabled.
    pub fn instantiate(&self, config: &Config) -> Result<Vec<Box<dyn Rule>>, ConfigError> {
        self.entries.iter().map(|entry| (entry.factory)(config)).collect()
    }

    /// Resolve the active rule set for `config`, in registration order.
    pub fn configure(&self, config: &Config) -> Result<Vec<Box<dyn Rule>>, ConfigError> {
        let known: BTreeSet<&str> = self.identifiers().collect();
        for unknown in config.unknown_rule_identifiers(&known) {
            log::warn!("Unknown rule in configuration: {unknown}");
        }

        let rules = self.instantiate(config)?;
        Ok(filter_rules(&rules, &config.global, config.language_version()))
    }
}
