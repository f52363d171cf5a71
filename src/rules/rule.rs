use crate::core::{canonical_metric, Measurable};
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Every checker name lives in this namespace.
pub const RULE_PREFIX: &str = "METRICS.";

/// Why a rule cannot run.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("checker has no name")]
    MissingName,

    #[error("checker '{name}' is not in the METRICS. namespace")]
    MissingPrefix { name: String },

    #[error("checker '{name}' defines no thresholds")]
    NoThresholds { name: String },

    #[error("invalid scope pattern '{pattern}': {source}")]
    InvalidScope {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Full-string regular expression matched against an entity's type label.
#[derive(Debug, Clone)]
pub struct ScopePattern {
    pattern: String,
    regex: Regex,
}

impl ScopePattern {
    /// Compile `pattern`; an empty pattern means "every entity" and yields `None`.
    pub fn parse(pattern: &str) -> Result<Option<Self>, RuleError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            RuleError::InvalidScope {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Some(Self {
            pattern: pattern.to_string(),
            regex,
        }))
    }

    pub fn matches(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for ScopePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// One metric limit of a rule.
#[derive(Debug, Clone)]
pub struct Threshold {
    pub scope: Option<ScopePattern>,
    /// Canonical metric key looked up on entities.
    pub metric: String,
    /// Short name used in templates.
    pub name: String,
    pub limit: f64,
}

impl Threshold {
    pub fn new(metric: &str, name: impl Into<String>, limit: f64) -> Self {
        Self {
            scope: None,
            metric: canonical_metric(metric).to_string(),
            name: name.into(),
            limit,
        }
    }

    pub fn with_scope(mut self, scope: Option<ScopePattern>) -> Self {
        self.scope = scope;
        self
    }

    /// Whether this threshold takes part in evaluating `entity`.
    pub fn applies_to(&self, entity: &dyn Measurable) -> bool {
        self.scope
            .as_ref()
            .map(|scope| scope.matches(entity.kind().label()))
            .unwrap_or(true)
    }

    /// Whether `key` designates this threshold, by metric key or short name.
    pub fn is_named(&self, key: &str) -> bool {
        self.metric == canonical_metric(key) || self.name == key
    }
}

/// How a rule obtains the values it compares against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Threshold metrics are read from the entity.
    Metrics,
    /// Distinct sources of a module's qualifying members.
    ModuleFileCount { min_loc: f64, min_ccm: f64 },
    /// Number of a module's qualifying members.
    ModuleFunctionCount { min_loc: f64, min_ccm: f64 },
}

/// A named set of metric thresholds and the templates its defects render with.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub description: String,
    pub scope: Option<ScopePattern>,
    pub thresholds: Vec<Threshold>,
    pub defect_template: Option<String>,
    pub event_template: Option<String>,
    pub evaluation: Evaluation,
}

impl Rule {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scope: None,
            thresholds: Vec::new(),
            defect_template: None,
            event_template: None,
            evaluation: Evaluation::Metrics,
        }
    }

    pub fn with_scope(mut self, scope: Option<ScopePattern>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.thresholds.push(threshold);
        self
    }

    pub fn with_templates(mut self, defect: Option<String>, event: Option<String>) -> Self {
        self.defect_template = defect;
        self.event_template = event;
        self
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.name.is_empty() {
            return Err(RuleError::MissingName);
        }
        if !self.name.starts_with(RULE_PREFIX) {
            return Err(RuleError::MissingPrefix {
                name: self.name.clone(),
            });
        }
        if self.thresholds.is_empty() {
            return Err(RuleError::NoThresholds {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether the rule may evaluate `entity` at all.
    pub fn applies_to(&self, entity: &dyn Measurable) -> bool {
        self.is_valid()
            && self
                .scope
                .as_ref()
                .map(|scope| scope.matches(entity.kind().label()))
                .unwrap_or(true)
    }

    /// Override the limit of the threshold designated by `key`.
    ///
    /// Returns `false` when no threshold matches.
    pub fn set_threshold(&mut self, key: &str, limit: f64) -> bool {
        let mut found = false;
        for threshold in self.thresholds.iter_mut().filter(|t| t.is_named(key)) {
            log::info!(
                "{}: threshold {} changed from {} to {}",
                self.name,
                threshold.name,
                threshold.limit,
                limit
            );
            threshold.limit = limit;
            found = true;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityKind, Unit};

    fn complexity_rule() -> Rule {
        Rule::new("METRICS.FUNCTION_TOO_COMPLEX", "Function is too complex")
            .with_threshold(Threshold::new("ccm", "ccm", 15.0))
    }

    #[test]
    fn valid_rule_passes_validation() {
        assert!(complexity_rule().validate().is_ok());
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let unnamed = Rule::new("", "").with_threshold(Threshold::new("loc", "loc", 1.0));
        assert!(matches!(unnamed.validate(), Err(RuleError::MissingName)));

        let unprefixed = Rule::new("TOO_LONG", "").with_threshold(Threshold::new("loc", "loc", 1.0));
        assert!(matches!(
            unprefixed.validate(),
            Err(RuleError::MissingPrefix { .. })
        ));

        let empty = Rule::new("METRICS.EMPTY", "");
        assert!(matches!(empty.validate(), Err(RuleError::NoThresholds { .. })));
        assert!(!empty.applies_to(&Unit::new("/a.c")));
    }

    #[test]
    fn scope_is_a_full_match_on_the_kind_label() {
        let scope = ScopePattern::parse("Module Metrics").unwrap();
        let rule = complexity_rule().with_scope(scope);
        assert!(!rule.applies_to(&Unit::new("/a/b.c")));

        let partial = ScopePattern::parse("Module").unwrap().unwrap();
        assert!(!partial.matches(EntityKind::Module.label()));
        let alternation = ScopePattern::parse("File Metrics|Module Metrics").unwrap().unwrap();
        assert!(alternation.matches(EntityKind::File.label()));
    }

    #[test]
    fn empty_scope_matches_everything() {
        assert!(ScopePattern::parse("").unwrap().is_none());
        assert!(complexity_rule().applies_to(&Unit::new("/a/b.c")));
    }

    #[test]
    fn bad_scope_pattern_is_an_error() {
        assert!(matches!(
            ScopePattern::parse("(unclosed"),
            Err(RuleError::InvalidScope { .. })
        ));
    }

    #[test]
    fn set_threshold_matches_metric_or_name() {
        let mut rule = complexity_rule();
        assert!(rule.set_threshold("cyclomatic-complexity", 20.0));
        assert_eq!(rule.thresholds[0].limit, 20.0);
        assert!(rule.set_threshold("ccm", 25.0));
        assert_eq!(rule.thresholds[0].limit, 25.0);
        assert!(!rule.set_threshold("fan-out", 3.0));
    }
}
