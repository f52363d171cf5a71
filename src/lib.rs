// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod io;
pub mod progress;
pub mod render;
pub mod rules;
pub mod summary;

// Re-export commonly used types
pub use crate::config::{CheckSettings, CheckerRegistry, RunConfig};
pub use crate::core::{
    group_units, parse_unit, Aggregate, Entity, EntityKind, Groupings, Measurable, StatData, Unit,
};
pub use crate::errors::{Error, Result};
pub use crate::io::{CovImportReport, RawRecord, RecordCursor};
pub use crate::render::{DefectRenderer, RenderedDefect};
pub use crate::rules::{Defect, Rule, RuleEngine, Threshold};
pub use crate::summary::CheckOutcome;
