use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root structure of a JSON run configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    /// Name of this configuration
    #[serde(default)]
    pub name: String,

    /// Free text description
    #[serde(default)]
    pub description: String,

    /// Directory holding additional checker definitions
    #[serde(default)]
    pub config: Option<PathBuf>,

    /// Intermediate directory the metrics export lives in
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Output tag inside the intermediate directory
    #[serde(default)]
    pub output: String,

    /// Prefix stripped from displayed pathnames
    #[serde(default)]
    pub strip_path: String,

    /// Regular expressions of pathnames to leave out
    #[serde(default)]
    pub excluded_files: Vec<String>,

    /// Checkers to enable, with optional threshold overrides
    #[serde(default)]
    pub checkers: Vec<CheckerConfig>,
}

/// One enabled checker in a run configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckerConfig {
    pub name: String,

    #[serde(default)]
    pub thresholds: Vec<ThresholdOverride>,
}

/// Replacement limit for one threshold of a checker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdOverride {
    /// Metric key or short name of the threshold
    pub metric: String,

    /// New limit; a number or a numeric string
    pub value: serde_json::Value,
}

impl ThresholdOverride {
    pub fn limit(&self) -> Option<f64> {
        numeric_value(&self.value)
    }
}

/// Read a number that may have been written as a JSON string.
pub(crate) fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
