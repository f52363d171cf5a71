//! Configuration: run configuration files, checker definitions, the checker
//! registry and resolved run settings.

pub mod checkers;
mod core;
mod loader;
pub mod registry;
pub mod settings;

pub use checkers::{
    discover_definitions, embedded_rules, load_definition, load_definitions, RuleDefinition,
    ThresholdDefinition, DEFINITION_PATTERN,
};
pub use self::core::{CheckerConfig, RunConfig, ThresholdOverride};
pub use loader::{load_run_config, parse_and_validate_config};
pub use registry::CheckerRegistry;
pub use settings::{metrics_file_in, CheckSettings, PathnameFilter, METRICS_FILE_NAME};

use crate::errors::Result;

/// Registry for a run: defaults, definitions from the checker directory,
/// the run configuration, then command line enables and overrides.
///
/// Every checker is enabled when nothing enabled one explicitly.
pub fn build_registry(settings: &CheckSettings) -> Result<CheckerRegistry> {
    let mut registry = CheckerRegistry::with_defaults();

    if let Some(dir) = &settings.checker_dir {
        registry.load_dir(dir)?;
    }

    registry.apply_run_config(&settings.run_config)?;

    for name in &settings.enable {
        registry.enable(name)?;
    }
    for option in &settings.checker_options {
        registry.apply_checker_option(option)?;
    }

    if settings.enable_all || !registry.has_enabled() {
        registry.enable_all();
    }

    Ok(registry)
}
