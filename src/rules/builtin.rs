//! Checkers that are always available without a definition file.
//!
//! Both look at module aggregates only and ignore members that are too
//! small or too simple to matter: a member counts when its lines of code
//! exceed 3 and its cyclomatic complexity exceeds 1.

use super::rule::{Evaluation, Rule, ScopePattern, Threshold};
use crate::core::{Aggregate, EntityKind, Measurable, Unit};
use std::collections::BTreeSet;

pub const MODULE_HAS_TOO_MANY_FILES: &str = "METRICS.MODULE_HAS_TOO_MANY_FILES";
pub const MODULE_HAS_TOO_MANY_FUNCTIONS: &str = "METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS";

pub const FILE_COUNT: &str = "file_count";
pub const FUNC_COUNT: &str = "func_count";

const DEFAULT_MAX_FILES: f64 = 20.0;
const DEFAULT_MAX_FUNCTIONS: f64 = 50.0;
const MIN_LOC: f64 = 3.0;
const MIN_CCM: f64 = 1.0;

fn module_scope() -> Option<ScopePattern> {
    ScopePattern::parse(&regex::escape(EntityKind::Module.label())).ok().flatten()
}

pub fn module_has_too_many_files() -> Rule {
    Rule::new(
        MODULE_HAS_TOO_MANY_FILES,
        "Module contains too many source files",
    )
    .with_scope(module_scope())
    .with_threshold(Threshold::new(FILE_COUNT, FILE_COUNT, DEFAULT_MAX_FILES))
    .with_evaluation(Evaluation::ModuleFileCount {
        min_loc: MIN_LOC,
        min_ccm: MIN_CCM,
    })
}

pub fn module_has_too_many_functions() -> Rule {
    Rule::new(
        MODULE_HAS_TOO_MANY_FUNCTIONS,
        "Module contains too many functions",
    )
    .with_scope(module_scope())
    .with_threshold(Threshold::new(FUNC_COUNT, FUNC_COUNT, DEFAULT_MAX_FUNCTIONS))
    .with_evaluation(Evaluation::ModuleFunctionCount {
        min_loc: MIN_LOC,
        min_ccm: MIN_CCM,
    })
}

/// Both built-in rules, without templates attached.
pub fn builtin_rules() -> Vec<Rule> {
    vec![module_has_too_many_files(), module_has_too_many_functions()]
}

fn qualifies(unit: &Unit, min_loc: f64, min_ccm: f64) -> bool {
    unit.lines_of_code() > min_loc && unit.cyclomatic_complexity() > min_ccm
}

/// Distinct sources across the qualifying members of `module`.
pub fn count_files(module: &Aggregate, min_loc: f64, min_ccm: f64) -> usize {
    module
        .members()
        .iter()
        .filter(|unit| qualifies(unit, min_loc, min_ccm))
        .flat_map(|unit| unit.sources())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Qualifying members of `module`.
pub fn count_functions(module: &Aggregate, min_loc: f64, min_ccm: f64) -> usize {
    module
        .members()
        .iter()
        .filter(|unit| qualifies(unit, min_loc, min_ccm))
        .count()
}
