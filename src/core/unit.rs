//! Function level measurable unit and its parsing from raw records.

use super::{
    canonical_metric, split_pathname, EntityKind, Measurable, CANONICAL_METRICS,
    CYCLOMATIC_COMPLEXITY, LINES_OF_CODE,
};
use crate::io::record_reader::RawRecord;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a raw record could not become a [`Unit`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitParseError {
    #[error("no metrics for function in {pathname}")]
    EmptyMetrics { pathname: String },

    #[error("bad format for metrics entry '{entry}' in {pathname}")]
    BadMetricEntry { pathname: String, entry: String },

    #[error("non-numeric value '{value}' for metric '{key}' in {pathname}")]
    NonNumericValue {
        pathname: String,
        key: String,
        value: String,
    },
}

/// One measured function.
///
/// Identity fields and metric values are kept apart: the pathname and name
/// fields identify the unit, `metrics` holds every numeric measurement keyed
/// by canonical metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pathname: String,
    display_pathname: String,
    directory: String,
    file_name: String,
    function: String,
    module: String,
    class: String,
    names: String,
    metrics_descriptor: String,
    coverage: Option<String>,
    impact: Option<String>,
    metrics: BTreeMap<String, f64>,
}

impl Unit {
    /// Create a unit for `pathname` with zeroed canonical metrics.
    ///
    /// Directory, file name, module and class default from the pathname.
    pub fn new(pathname: impl Into<String>) -> Self {
        let pathname = pathname.into();
        let (directory, file_name) = match split_pathname(&pathname) {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => {
                log::warn!("Suspicious pathname '{}'", pathname);
                (String::new(), String::new())
            }
        };

        Self {
            display_pathname: pathname.clone(),
            module: directory.clone(),
            class: file_name.clone(),
            directory,
            file_name,
            pathname,
            function: String::new(),
            names: String::new(),
            metrics_descriptor: String::new(),
            coverage: None,
            impact: None,
            metrics: CANONICAL_METRICS
                .iter()
                .map(|key| (key.to_string(), 0.0))
                .collect(),
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Set a metric, resolving short aliases.
    pub fn with_metric(mut self, key: &str, value: f64) -> Self {
        self.metrics.insert(canonical_metric(key).to_string(), value);
        self
    }

    /// Strip a literal prefix from the display pathname.
    ///
    /// The raw pathname, used for grouping, is left untouched.
    pub fn with_stripped_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            if let Some(rest) = self.pathname.strip_prefix(prefix) {
                self.display_pathname = rest.to_string();
            }
        }
        self
    }

    /// Raw pathname as found in the export.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Pathname shown in reports.
    pub fn display_pathname(&self) -> &str {
        &self.display_pathname
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn lines_of_code(&self) -> f64 {
        self.metrics.get(LINES_OF_CODE).copied().unwrap_or(0.0)
    }

    pub fn cyclomatic_complexity(&self) -> f64 {
        self.metrics.get(CYCLOMATIC_COMPLEXITY).copied().unwrap_or(0.0)
    }
}

impl Measurable for Unit {
    fn kind(&self) -> EntityKind {
        EntityKind::Function
    }

    fn name(&self) -> &str {
        if self.function.is_empty() {
            &self.display_pathname
        } else {
            &self.function
        }
    }

    fn sources(&self) -> Vec<String> {
        vec![self.display_pathname.clone()]
    }

    fn sources_label(&self) -> String {
        self.display_pathname.clone()
    }

    fn is_metric(&self, key: &str) -> bool {
        self.metrics.contains_key(canonical_metric(key))
    }

    fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(canonical_metric(key)).copied()
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("kind", self.kind().label().to_string()),
            ("name", self.name().to_string()),
            ("file", self.display_pathname.clone()),
            ("pathname", self.pathname.clone()),
            ("sources", self.sources_label()),
            ("function", self.function.clone()),
            ("module", self.module.clone()),
            ("class", self.class.clone()),
            ("fdir", self.directory.clone()),
            ("fname", self.file_name.clone()),
            ("names", self.names.clone()),
            ("metrics", self.metrics_descriptor.clone()),
        ];
        if let Some(coverage) = &self.coverage {
            attributes.push(("coverage", coverage.clone()));
        }
        if let Some(impact) = &self.impact {
            attributes.push(("impact", impact.clone()));
        }
        attributes
    }

    fn metric_values(&self) -> Vec<(String, f64)> {
        self.metrics.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// Turn a raw record into a [`Unit`].
///
/// The metrics descriptor is `key:value` pairs separated by `;`. `lc` and `cc`
/// map to the canonical lines-of-code and cyclomatic-complexity keys. The
/// names descriptor carries `fn:`, `mn:` and `cn:` entries; a class name is
/// cut at its first `$`.
pub fn parse_unit(
    record: &RawRecord,
    strip_prefix: Option<&str>,
) -> Result<Unit, UnitParseError> {
    let mut unit = Unit::new(record.file.as_str());
    let metrics = parse_metrics(&record.file, &record.metrics)?;
    unit.metrics.extend(metrics);

    apply_names(&mut unit, &record.names);

    unit.names = record.names.clone();
    unit.metrics_descriptor = record.metrics.clone();
    unit.coverage = record.coverage.clone();
    unit.impact = record.impact.clone();

    Ok(match strip_prefix {
        Some(prefix) => unit.with_stripped_prefix(prefix),
        None => unit,
    })
}

fn parse_metrics(pathname: &str, descriptor: &str) -> Result<Vec<(String, f64)>, UnitParseError> {
    let entries: Vec<&str> = descriptor
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() {
        return Err(UnitParseError::EmptyMetrics {
            pathname: pathname.to_string(),
        });
    }

    entries
        .into_iter()
        .map(|entry| {
            let fields: Vec<&str> = entry.split(':').collect();
            let [key, value] = fields.as_slice() else {
                return Err(UnitParseError::BadMetricEntry {
                    pathname: pathname.to_string(),
                    entry: entry.to_string(),
                });
            };
            let non_numeric = || UnitParseError::NonNumericValue {
                pathname: pathname.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            };
            let parsed = value.trim().parse::<f64>().map_err(|_| non_numeric())?;
            if !parsed.is_finite() {
                return Err(non_numeric());
            }
            Ok((canonical_metric(key.trim()).to_string(), parsed))
        })
        .collect()
}

fn apply_names(unit: &mut Unit, descriptor: &str) {
    if descriptor.is_empty() {
        log::debug!("No names for function in {}", unit.pathname);
        return;
    }

    for field in descriptor.split(';') {
        if let Some(function) = field.strip_prefix("fn:") {
            unit.function = function.to_string();
        } else if let Some(module) = field.strip_prefix("mn:") {
            unit.module = module.to_string();
        } else if let Some(class) = field.strip_prefix("cn:") {
            let end = class.find('$').unwrap_or(class.len());
            unit.class = class[..end].to_string();
        }
    }
}
