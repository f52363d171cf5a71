//! Available and enabled checkers.

use super::checkers::{embedded_rules, load_definitions, with_embedded_templates};
use super::core::RunConfig;
use crate::errors::{Error, Result};
use crate::rules::{builtin_rules, Evaluation, Rule};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Registry of every known checker and the subset enabled for a run.
#[derive(Debug, Clone, Default)]
pub struct CheckerRegistry {
    available: BTreeMap<String, Rule>,
    enabled: BTreeSet<String>,
}

impl CheckerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in and embedded checkers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for rule in builtin_rules().into_iter().map(with_embedded_templates) {
            registry.register(rule);
        }
        for rule in embedded_rules() {
            registry.register(rule);
        }
        registry
    }

    /// Add `rule` to the available checkers, replacing one with the same name.
    ///
    /// Invalid rules are logged and left out. A definition replacing a
    /// built-in checker keeps the built-in's way of computing its value and,
    /// unless it sets its own, the built-in's scope.
    pub fn register(&mut self, mut rule: Rule) -> bool {
        if let Err(e) = rule.validate() {
            log::warn!("Ignoring checker: {}", e);
            return false;
        }
        if let Some(existing) = self.available.get(&rule.name) {
            if existing.evaluation != Evaluation::Metrics {
                rule.evaluation = existing.evaluation;
                if rule.scope.is_none() {
                    rule.scope = existing.scope.clone();
                }
            }
            log::debug!("Checker {} redefined", rule.name);
        }
        self.available.insert(rule.name.clone(), rule);
        true
    }

    /// Register every definition found below `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let count = load_definitions(dir)?
            .into_iter()
            .map(|rule| self.register(rule))
            .filter(|registered| *registered)
            .count();
        log::info!("Loaded {} checkers from {}", count, dir.display());
        Ok(count)
    }

    pub fn available(&self) -> impl Iterator<Item = &Rule> {
        self.available.values()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.available.get(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    pub fn has_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    pub fn enable(&mut self, name: &str) -> Result<()> {
        if !self.available.contains_key(name) {
            return Err(Error::configuration(format!("Unknown checker {}", name)));
        }
        if self.enabled.insert(name.to_string()) {
            log::info!("Checker {} enabled", name);
        }
        Ok(())
    }

    pub fn enable_all(&mut self) {
        self.enabled.extend(self.available.keys().cloned());
    }

    /// Override a threshold limit of an available checker.
    pub fn set_threshold(&mut self, checker: &str, metric: &str, limit: f64) -> Result<()> {
        let rule = self
            .available
            .get_mut(checker)
            .ok_or_else(|| Error::configuration(format!("Unknown checker {}", checker)))?;
        if !rule.set_threshold(metric, limit) {
            return Err(Error::configuration(format!(
                "Checker {} has no threshold for {}",
                checker, metric
            )));
        }
        Ok(())
    }

    /// Apply a `CHECKER:METRIC:THRESHOLD` option, enabling the checker.
    pub fn apply_checker_option(&mut self, option: &str) -> Result<()> {
        let fields: Vec<&str> = option.split(':').collect();
        let [checker, metric, value] = fields.as_slice() else {
            return Err(Error::configuration(format!(
                "Checker option '{}' is not CHECKER:METRIC:THRESHOLD",
                option
            )));
        };
        let limit: f64 = value.trim().parse().map_err(|_| {
            Error::configuration(format!(
                "Checker option '{}' has a non-numeric threshold",
                option
            ))
        })?;
        self.enable(checker)?;
        self.set_threshold(checker, metric, limit)
    }

    /// Enable the checkers a run configuration lists and apply its overrides.
    ///
    /// Overrides with a non-numeric value are logged and skipped.
    pub fn apply_run_config(&mut self, config: &RunConfig) -> Result<()> {
        for checker in &config.checkers {
            self.enable(&checker.name)?;
            if checker.thresholds.is_empty() {
                log::debug!("Using default thresholds for checker {}", checker.name);
            }
            for threshold in &checker.thresholds {
                match threshold.limit() {
                    Some(limit) => self.set_threshold(&checker.name, &threshold.metric, limit)?,
                    None => log::warn!(
                        "Invalid value {} for {} of checker {}",
                        threshold.value,
                        threshold.metric,
                        checker.name
                    ),
                }
            }
        }
        Ok(())
    }

    /// Enabled checkers, in name order.
    pub fn enabled_rules(&self) -> Vec<Rule> {
        self.enabled
            .iter()
            .filter_map(|name| self.available.get(name))
            .cloned()
            .collect()
    }
}
