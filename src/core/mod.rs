//! Measurable entities: function units and the file and module aggregates
//! built over them.
//!
//! Every entity answers the same questions through [`Measurable`]: what kind
//! it is, its display name, which sources it covers, and the value of a named
//! metric. Rules and templates only ever see entities through this trait or
//! through the [`Entity`] handle.

pub mod aggregate;
pub mod grouping;
pub mod unit;

use std::fmt;
use std::sync::Arc;

pub use aggregate::{Aggregate, StatData};
pub use grouping::{group_units, Groupings};
pub use unit::{parse_unit, Unit, UnitParseError};

/// Canonical key for lines of code.
pub const LINES_OF_CODE: &str = "lines-of-code";
/// Canonical key for cyclomatic complexity.
pub const CYCLOMATIC_COMPLEXITY: &str = "cyclomatic-complexity";

/// Metrics every entity carries.
pub const CANONICAL_METRICS: [&str; 2] = [LINES_OF_CODE, CYCLOMATIC_COMPLEXITY];

/// Resolve short metric aliases to their canonical key.
pub fn canonical_metric(name: &str) -> &str {
    match name {
        "lc" | "loc" => LINES_OF_CODE,
        "cc" | "ccm" => CYCLOMATIC_COMPLEXITY,
        other => other,
    }
}

/// Kind of measurable entity.
///
/// The label is what rule scope patterns are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Function,
    File,
    Module,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Function => "Function Metrics",
            EntityKind::File => "File Metrics",
            EntityKind::Module => "Module Metrics",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Common capability of units and aggregates.
pub trait Measurable {
    fn kind(&self) -> EntityKind;

    /// Display name: the function for units, the path or module for aggregates.
    fn name(&self) -> &str;

    /// Source identifiers covered by this entity, sorted and de-duplicated.
    fn sources(&self) -> Vec<String>;

    /// Comma-joined [`Measurable::sources`].
    fn sources_label(&self) -> String {
        self.sources().join(",")
    }

    /// Whether `key` names a metric this entity can answer for.
    fn is_metric(&self, key: &str) -> bool;

    /// Value of `key`, or `None` when [`Measurable::is_metric`] is false.
    fn metric(&self, key: &str) -> Option<f64>;

    /// Identity attributes exposed to defect templates.
    fn attributes(&self) -> Vec<(&'static str, String)>;

    /// Directly stored metric values exposed to defect templates.
    fn metric_values(&self) -> Vec<(String, f64)>;
}

/// Shared handle to any measurable entity.
#[derive(Debug, Clone)]
pub enum Entity {
    Unit(Arc<Unit>),
    Aggregate(Arc<Aggregate>),
}

impl Entity {
    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Entity::Aggregate(aggregate) => Some(aggregate),
            Entity::Unit(_) => None,
        }
    }

    fn inner(&self) -> &dyn Measurable {
        match self {
            Entity::Unit(unit) => unit.as_ref(),
            Entity::Aggregate(aggregate) => aggregate.as_ref(),
        }
    }
}

impl From<Arc<Unit>> for Entity {
    fn from(unit: Arc<Unit>) -> Self {
        Entity::Unit(unit)
    }
}

impl From<Arc<Aggregate>> for Entity {
    fn from(aggregate: Arc<Aggregate>) -> Self {
        Entity::Aggregate(aggregate)
    }
}

impl Measurable for Entity {
    fn kind(&self) -> EntityKind {
        self.inner().kind()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn sources(&self) -> Vec<String> {
        self.inner().sources()
    }

    fn sources_label(&self) -> String {
        self.inner().sources_label()
    }

    fn is_metric(&self, key: &str) -> bool {
        self.inner().is_metric(key)
    }

    fn metric(&self, key: &str) -> Option<f64> {
        self.inner().metric(key)
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        self.inner().attributes()
    }

    fn metric_values(&self) -> Vec<(String, f64)> {
        self.inner().metric_values()
    }
}

/// Format a metric value, dropping the fraction when it is zero.
pub fn format_metric_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Split a pathname at its last separator into directory and file name.
pub(crate) fn split_pathname(pathname: &str) -> Option<(&str, &str)> {
    pathname
        .rfind(['/', '\\'])
        .map(|pos| (&pathname[..pos], &pathname[pos + 1..]))
}
