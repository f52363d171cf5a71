//! Threshold rules ("checkers") and their evaluation.

pub mod builtin;
pub mod engine;
pub mod rule;

pub use builtin::{builtin_rules, MODULE_HAS_TOO_MANY_FILES, MODULE_HAS_TOO_MANY_FUNCTIONS};
pub use engine::{evaluate, Defect, RuleEngine};
pub use rule::{Evaluation, Rule, RuleError, ScopePattern, Threshold, RULE_PREFIX};
