//! Command implementations.
//!
//! - **check**: read a metrics export, run the enabled checkers and write
//!   the cov-import-results report
//! - **list-checkers**: print the available checkers

pub mod check;
pub mod list;

pub use check::{collect_units, entities_of, find_defects, run_check, write_report, UnitHarvest};
pub use list::{checker_table, list_checkers};
