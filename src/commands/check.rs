use crate::cli::{configure_thread_pool, get_worker_count};
use crate::config::{build_registry, CheckSettings, PathnameFilter};
use crate::core::{group_units, parse_unit, Entity, Unit};
use crate::io::{CovImportReport, JsonReportWriter, RawRecord, RecordCursor, ReportWriter};
use crate::progress::{ProgressConfig, ProgressManager};
use crate::render::{DefectRenderer, RenderedDefect};
use crate::rules::{Rule, RuleEngine};
use crate::summary::{format_summary, CheckOutcome, DefectSummary};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

/// Units read from a record stream.
#[derive(Debug, Default)]
pub struct UnitHarvest {
    pub units: Vec<Arc<Unit>>,
    pub rejected: usize,
    pub excluded: usize,
}

/// Parse records into units, dropping those that fail to parse or that the
/// filter excludes.
pub fn collect_units(
    records: impl Iterator<Item = RawRecord>,
    strip_prefix: Option<&str>,
    filter: &PathnameFilter,
    progress: &ProgressBar,
) -> UnitHarvest {
    let mut harvest = UnitHarvest::default();

    for record in records {
        progress.inc(1);
        let unit = match parse_unit(&record, strip_prefix) {
            Ok(unit) => unit,
            Err(e) => {
                log::warn!("Skipping function: {}", e);
                harvest.rejected += 1;
                continue;
            }
        };
        if filter.is_excluded(&unit) {
            harvest.excluded += 1;
            continue;
        }
        harvest.units.push(Arc::new(unit));
    }

    harvest
}

/// Every entity to check: functions first, then files and modules.
pub fn entities_of(units: &[Arc<Unit>]) -> Vec<Entity> {
    let groupings = group_units(units);
    log::info!(
        "Grouped {} functions into {} files and {} modules",
        units.len(),
        groupings.files.len(),
        groupings.modules.len()
    );
    units
        .iter()
        .cloned()
        .map(Entity::from)
        .chain(groupings.entities())
        .collect()
}

/// Evaluate `rules` over `entities` and render every defect.
pub fn find_defects(rules: Vec<Rule>, entities: &[Entity], parallel: bool) -> Vec<RenderedDefect> {
    let engine = RuleEngine::new(rules).with_parallel(parallel);
    let defects = engine.evaluate_all(entities);
    log::info!(
        "{} checkers found {} defects in {} entities",
        engine.rules().len(),
        defects.len(),
        entities.len()
    );
    DefectRenderer::new().render_all(&defects)
}

/// Write the report for `defects` to the settings' report file.
pub fn write_report(settings: &CheckSettings, defects: &[RenderedDefect]) -> Result<()> {
    let report = CovImportReport::from_defects(defects);
    let file = File::create(&settings.report_file).with_context(|| {
        format!(
            "Failed to create report file {}",
            settings.report_file.display()
        )
    })?;
    JsonReportWriter::new(BufWriter::new(file))
        .write_report(&report)
        .with_context(|| format!("Failed to write {}", settings.report_file.display()))
}

/// Run a full check and print its summary.
pub fn run_check(settings: &CheckSettings, verbosity: u8) -> Result<CheckOutcome> {
    if settings.parallel {
        configure_thread_pool(settings.jobs);
        log::debug!(
            "Evaluating checkers on {} threads",
            get_worker_count(settings.jobs)
        );
    }
    if !settings.name.is_empty() {
        log::info!("Run {}: {}", settings.name, settings.description);
    }

    let registry = build_registry(settings).context("Invalid checker configuration")?;
    let rules = registry.enabled_rules();
    log::info!(
        "Enabled checkers: {}",
        rules
            .iter()
            .map(|rule| rule.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut cursor = RecordCursor::open(&settings.metrics_file).with_context(|| {
        format!(
            "Failed to open metrics file {}",
            settings.metrics_file.display()
        )
    })?;

    let manager = ProgressManager::new(ProgressConfig::from_env(settings.quiet, verbosity));
    let progress = manager.create_counter("Reading function metrics");
    let harvest = collect_units(
        cursor.by_ref(),
        settings.strip_path.as_deref(),
        &settings.filter,
        &progress,
    );
    progress.finish_and_clear();

    if let Some(error) = cursor.stream_error() {
        log::error!(
            "Metrics stream {} ended early: {}",
            settings.metrics_file.display(),
            error
        );
    }

    let entities = entities_of(&harvest.units);
    let checkers = rules.len();
    let defects = find_defects(rules, &entities, settings.parallel);
    write_report(settings, &defects)?;

    let outcome = CheckOutcome {
        records_read: cursor.produced(),
        records_skipped: cursor.skipped(),
        units: harvest.units.len(),
        units_rejected: harvest.rejected,
        units_excluded: harvest.excluded,
        aggregates: entities.len() - harvest.units.len(),
        checkers,
        defects: defects.len(),
        stream_error: cursor.stream_error().map(str::to_string),
        report_file: settings.report_file.clone(),
    };

    if let Err(e) = manager.clear() {
        log::debug!("Cannot clear progress display: {}", e);
    }
    print!(
        "{}",
        format_summary(&outcome, &DefectSummary::from_defects(&defects))
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Threshold;

    fn record(file: &str, function: &str, metrics: &str) -> RawRecord {
        RawRecord {
            file: file.to_string(),
            names: format!("fn:{};", function),
            metrics: metrics.to_string(),
            coverage: None,
            impact: None,
        }
    }

    #[test]
    fn harvest_counts_rejected_and_excluded_units() {
        let records = vec![
            record("/src/a.c", "ok", "lc:10;cc:2"),
            record("/src/a.c", "bad", "lc:10;cc:abc"),
            record("/src/gen/b.c", "gen", "lc:1;cc:1"),
        ];
        let filter = PathnameFilter::new(&[".*/gen/.*"]).unwrap();
        let harvest = collect_units(
            records.into_iter(),
            None,
            &filter,
            &ProgressBar::hidden(),
        );
        assert_eq!(harvest.units.len(), 1);
        assert_eq!(harvest.rejected, 1);
        assert_eq!(harvest.excluded, 1);
    }

    #[test]
    fn entities_list_functions_before_aggregates() {
        let units: Vec<Arc<Unit>> = ["/m/a.c", "/m/b.c"]
            .iter()
            .map(|path| Arc::new(Unit::new(*path).with_function("f")))
            .collect();
        let entities = entities_of(&units);
        // two functions, two files, one module
        assert_eq!(entities.len(), 5);
        assert!(entities[0].as_aggregate().is_none());
        assert!(entities[2].as_aggregate().is_some());
    }

    #[test]
    fn defects_are_rendered_with_templates() {
        let unit = Arc::new(
            Unit::new("/src/a.c")
                .with_function("f")
                .with_metric("lc", 50.0),
        );
        let rule = Rule::new("METRICS.LONG", "long")
            .with_threshold(Threshold::new("lines-of-code", "loc", 30.0))
            .with_templates(
                Some(r#"{"checker":"${checker}","loc":${loc}}"#.to_string()),
                None,
            );
        let defects = find_defects(vec![rule], &[Entity::from(unit)], false);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].fragment["loc"], 50);
    }

    #[test]
    fn rules_without_templates_produce_no_fragments() {
        let unit = Arc::new(Unit::new("/src/a.c").with_metric("lc", 50.0));
        let rule = Rule::new("METRICS.NO_TEMPLATE", "")
            .with_threshold(Threshold::new("lines-of-code", "loc", 1.0));
        assert!(find_defects(vec![rule], &[Entity::from(unit)], true).is_empty());
    }
}
