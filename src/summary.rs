//! End-of-run summary: defects per checker and per file.

use crate::render::RenderedDefect;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Counts gathered over one check run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub records_read: usize,
    pub records_skipped: usize,
    pub units: usize,
    pub units_rejected: usize,
    pub units_excluded: usize,
    pub aggregates: usize,
    pub checkers: usize,
    pub defects: usize,
    pub stream_error: Option<String>,
    pub report_file: PathBuf,
}

/// Defect counts keyed by checker and by sources label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectSummary {
    pub by_checker: Vec<(String, usize)>,
    pub by_file: Vec<(String, usize)>,
}

impl DefectSummary {
    pub fn from_defects(defects: &[RenderedDefect]) -> Self {
        let by_checker = count_by(defects.iter().map(|d| d.checker.clone()));
        let by_file = count_by(defects.iter().map(RenderedDefect::sources_label));
        Self { by_checker, by_file }
    }

    pub fn total(&self) -> usize {
        self.by_checker.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_checker.is_empty()
    }
}

/// Most frequent first, then by label.
fn count_by(labels: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn count_table(heading: &str, rows: &[(String, usize)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(heading), Cell::new("Defects")]);
    for (label, count) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Render the summary as text for the terminal.
pub fn format_summary(outcome: &CheckOutcome, summary: &DefectSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Read {} records ({} skipped), {} functions checked ({} rejected, {} excluded), {} files and modules",
        outcome.records_read,
        outcome.records_skipped,
        outcome.units,
        outcome.units_rejected,
        outcome.units_excluded,
        outcome.aggregates
    );
    if let Some(error) = &outcome.stream_error {
        let _ = writeln!(out, "{} {}", "Metrics stream ended early:".yellow(), error);
    }

    if summary.is_empty() {
        let _ = writeln!(
            out,
            "{} no defects from {} checkers",
            "OK".green().bold(),
            outcome.checkers
        );
    } else {
        let _ = writeln!(out, "{}", count_table("Checker", &summary.by_checker));
        let _ = writeln!(out, "{}", count_table("File", &summary.by_file));
        let _ = writeln!(
            out,
            "{} {} defects from {} checkers",
            "FOUND".red().bold(),
            summary.total(),
            outcome.checkers
        );
    }

    let _ = writeln!(out, "Report written to {}", outcome.report_file.display());
    out
}
