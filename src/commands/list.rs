use crate::config::{load_run_config, CheckerRegistry};
use crate::rules::Rule;
use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use std::path::Path;

/// Table of the available checkers, marking the enabled ones.
pub fn checker_table(registry: &CheckerRegistry) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Checker", "Enabled", "Scope", "Thresholds", "Description"]);

    for rule in registry.available() {
        let enabled = if registry.is_enabled(&rule.name) { "yes" } else { "" };
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(enabled),
            Cell::new(rule.scope.as_ref().map(|s| s.as_str()).unwrap_or("*")),
            Cell::new(describe_thresholds(rule)),
            Cell::new(&rule.description),
        ]);
    }
    table
}

fn describe_thresholds(rule: &Rule) -> String {
    rule.thresholds
        .iter()
        .map(|t| format!("{} > {}", t.name, crate::core::format_metric_value(t.limit)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the available checkers.
pub fn list_checkers(config_dir: Option<&Path>, config_file: Option<&Path>) -> Result<()> {
    let run_config = config_file
        .map(load_run_config)
        .transpose()
        .context("Failed to load run configuration")?
        .unwrap_or_default();

    let mut registry = CheckerRegistry::with_defaults();
    if let Some(dir) = config_dir.or(run_config.config.as_deref()) {
        registry
            .load_dir(dir)
            .with_context(|| format!("Failed to load checkers from {}", dir.display()))?;
    }
    registry
        .apply_run_config(&run_config)
        .context("Invalid checker configuration")?;

    println!("{}", checker_table(&registry));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_checker() {
        let mut registry = CheckerRegistry::with_defaults();
        registry.enable("METRICS.FUNCTION_TOO_LONG").unwrap();
        let text = checker_table(&registry).to_string();
        assert!(text.contains("METRICS.FUNCTION_TOO_COMPLEX"));
        assert!(text.contains("METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS"));
        assert!(text.contains("file_count > 20"));
        assert!(text.contains("yes"));
    }
}
