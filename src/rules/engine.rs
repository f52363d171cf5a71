//! Rule evaluation.
//!
//! A rule fires on an entity when *every* one of its thresholds is strictly
//! exceeded. Thresholds whose scope excludes the entity, or whose metric the
//! entity does not know, count as not exceeded, so they can prevent a rule
//! from firing but never make it fire.

use super::builtin::{count_files, count_functions, FILE_COUNT, FUNC_COUNT};
use super::rule::{Evaluation, Rule};
use crate::core::{Entity, Measurable};
use rayon::prelude::*;
use std::sync::Arc;

/// One rule firing on one entity.
#[derive(Debug, Clone)]
pub struct Defect {
    pub rule: Arc<Rule>,
    pub entity: Entity,
    /// Metric keys of the exceeded thresholds, in threshold order.
    pub violations: Vec<String>,
    /// Value compared against each threshold that could be resolved.
    pub observed: Vec<(String, f64)>,
}

impl Defect {
    pub fn observed(&self, metric: &str) -> Option<f64> {
        self.observed
            .iter()
            .find(|(key, _)| key == metric)
            .map(|(_, value)| *value)
    }
}

/// Evaluate `rule` against `entity`, yielding at most one defect.
pub fn evaluate(rule: &Arc<Rule>, entity: &Entity) -> Option<Defect> {
    if !rule.applies_to(entity) {
        return None;
    }

    let resolve = |metric: &str| -> Option<f64> {
        let computed = match rule.evaluation {
            Evaluation::Metrics => None,
            Evaluation::ModuleFileCount { min_loc, min_ccm } if metric == FILE_COUNT => entity
                .as_aggregate()
                .map(|module| count_files(module, min_loc, min_ccm) as f64),
            Evaluation::ModuleFunctionCount { min_loc, min_ccm } if metric == FUNC_COUNT => entity
                .as_aggregate()
                .map(|module| count_functions(module, min_loc, min_ccm) as f64),
            _ => None,
        };
        computed.or_else(|| {
            if entity.is_metric(metric) {
                entity.metric(metric)
            } else {
                None
            }
        })
    };

    let mut violations = Vec::new();
    let mut observed = Vec::new();
    for threshold in &rule.thresholds {
        if !threshold.applies_to(entity) {
            continue;
        }
        let Some(value) = resolve(&threshold.metric) else {
            log::warn!(
                "{}: metric '{}' is not defined for {} '{}'",
                rule.name,
                threshold.metric,
                entity.kind(),
                entity.name()
            );
            continue;
        };
        observed.push((threshold.metric.clone(), value));
        if value > threshold.limit {
            violations.push(threshold.metric.clone());
        }
    }

    if violations.len() >= rule.thresholds.len() {
        Some(Defect {
            rule: Arc::clone(rule),
            entity: entity.clone(),
            violations,
            observed,
        })
    } else {
        None
    }
}

/// Evaluates a fixed rule set against entities.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Arc<Rule>>,
    parallel: bool,
}

impl RuleEngine {
    /// Build an engine from `rules`, dropping the invalid ones.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|rule| match rule.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Ignoring checker: {}", e);
                    false
                }
            })
            .map(Arc::new)
            .collect();
        Self {
            rules,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// All defects produced by the engine's rules on one entity.
    pub fn evaluate(&self, entity: &Entity) -> Vec<Defect> {
        self.rules
            .iter()
            .filter_map(|rule| evaluate(rule, entity))
            .collect()
    }

    /// All defects over `entities`, in a stable order.
    ///
    /// Defects are ordered by rule name, then by the entity's sources, name
    /// and kind, independently of how the work was scheduled.
    pub fn evaluate_all(&self, entities: &[Entity]) -> Vec<Defect> {
        let mut defects: Vec<Defect> = if self.parallel {
            entities
                .par_iter()
                .flat_map_iter(|entity| self.evaluate(entity))
                .collect()
        } else {
            entities
                .iter()
                .flat_map(|entity| self.evaluate(entity))
                .collect()
        };

        defects.sort_by_cached_key(|defect| {
            (
                defect.rule.name.clone(),
                defect.entity.sources_label(),
                defect.entity.name().to_string(),
                defect.entity.kind(),
            )
        });
        log::debug!(
            "{} rules produced {} defects over {} entities",
            self.rules.len(),
            defects.len(),
            entities.len()
        );
        defects
    }
}
