//! Checker definitions: JSON files named `METRICS.<NAME>.json`.
//!
//! A definition names its templates by file name; they are read from the
//! directory the definition was found in. A set of definitions and the
//! templates of the built-in checkers are compiled into the binary.

use super::core::numeric_value;
use crate::errors::{Error, Result};
use crate::rules::{Rule, RuleError, ScopePattern, Threshold};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name pattern of checker definitions
pub const DEFINITION_PATTERN: &str = "METRICS.*.json";

/// Definitions and templates shipped with the binary, by file name.
const EMBEDDED: &[(&str, &str)] = &[
    (
        "METRICS.FUNCTION_TOO_COMPLEX.json",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_COMPLEX.json"),
    ),
    (
        "METRICS.FUNCTION_TOO_COMPLEX.txt",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_COMPLEX.txt"),
    ),
    (
        "METRICS.FUNCTION_TOO_COMPLEX.events.txt",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_COMPLEX.events.txt"),
    ),
    (
        "METRICS.FUNCTION_TOO_LONG.json",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_LONG.json"),
    ),
    (
        "METRICS.FUNCTION_TOO_LONG.txt",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_LONG.txt"),
    ),
    (
        "METRICS.FUNCTION_TOO_LONG.events.txt",
        include_str!("../../resources/checkers/METRICS.FUNCTION_TOO_LONG.events.txt"),
    ),
    (
        "METRICS.MODULE_HAS_TOO_MANY_FILES.txt",
        include_str!("../../resources/checkers/METRICS.MODULE_HAS_TOO_MANY_FILES.txt"),
    ),
    (
        "METRICS.MODULE_HAS_TOO_MANY_FILES.events.txt",
        include_str!("../../resources/checkers/METRICS.MODULE_HAS_TOO_MANY_FILES.events.txt"),
    ),
    (
        "METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS.txt",
        include_str!("../../resources/checkers/METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS.txt"),
    ),
    (
        "METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS.events.txt",
        include_str!("../../resources/checkers/METRICS.MODULE_HAS_TOO_MANY_FUNCTIONS.events.txt"),
    ),
];

/// Look up an embedded resource by file name.
pub fn embedded_resource(file_name: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(name, _)| *name == file_name)
        .map(|(_, text)| *text)
}

/// Main and event template file names for a checker.
pub fn template_file_names(checker: &str) -> (String, String) {
    (format!("{}.txt", checker), format!("{}.events.txt", checker))
}

/// On-disk form of a checker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RuleDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Type label pattern the checker applies to
    #[serde(default)]
    pub scope: String,

    #[serde(default)]
    pub thresholds: Vec<ThresholdDefinition>,

    #[serde(default)]
    pub defect_template: Option<String>,

    #[serde(default)]
    pub defect_event_template: Option<String>,
}

/// On-disk form of a threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdDefinition {
    #[serde(default)]
    pub scope: String,

    /// Short name used in templates
    #[serde(default)]
    pub name: String,

    /// Metric key
    pub metrics: String,

    pub threshold: serde_json::Value,
}

impl RuleDefinition {
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Build the rule, reading template files through `load_template`.
    ///
    /// Thresholds with a non-numeric limit are dropped with a warning; the
    /// rule is still returned and fails validation if none remain.
    pub fn into_rule<F>(self, load_template: F) -> std::result::Result<Rule, RuleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scope = ScopePattern::parse(&self.scope)?;
        let mut rule = Rule::new(self.name, self.description).with_scope(scope);

        for definition in self.thresholds {
            let Some(limit) = numeric_value(&definition.threshold) else {
                log::warn!(
                    "{}: ignoring threshold {} with non-numeric limit {}",
                    rule.name,
                    definition.metrics,
                    definition.threshold
                );
                continue;
            };
            let name = if definition.name.is_empty() {
                definition.metrics.clone()
            } else {
                definition.name
            };
            let scope = ScopePattern::parse(&definition.scope)?;
            rule = rule.with_threshold(Threshold::new(&definition.metrics, name, limit).with_scope(scope));
        }

        let defect = self
            .defect_template
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(&load_template);
        let event = self
            .defect_event_template
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(&load_template);

        Ok(rule.with_templates(defect, event))
    }
}

/// Embedded checker definitions.
pub fn embedded_rules() -> Vec<Rule> {
    EMBEDDED
        .iter()
        .filter(|(name, _)| name.ends_with(".json"))
        .filter_map(|(name, text)| {
            let parsed = RuleDefinition::from_json(text)
                .map_err(|e| e.to_string())
                .and_then(|definition| {
                    definition
                        .into_rule(|file| embedded_resource(file).map(str::to_string))
                        .map_err(|e| e.to_string())
                });
            match parsed {
                Ok(rule) => Some(rule),
                Err(e) => {
                    log::error!("Embedded checker {} is invalid: {}", name, e);
                    None
                }
            }
        })
        .collect()
}

/// Attach the embedded templates of a built-in checker.
pub fn with_embedded_templates(rule: Rule) -> Rule {
    let (main, events) = template_file_names(&rule.name);
    let main = embedded_resource(&main).map(str::to_string);
    let events = embedded_resource(&events).map(str::to_string);
    rule.with_templates(main, events)
}

/// Load one definition file, reading templates next to it.
pub fn load_definition(path: &Path) -> Result<Rule> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::file_system("Cannot read checker definition", path, e))?;
    let definition = RuleDefinition::from_json(&text)
        .map_err(|e| Error::checker_definition(path, e.to_string()))?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    definition
        .into_rule(|file| read_template(&base, file))
        .map_err(|e| Error::checker_definition(path, e.to_string()))
}

fn read_template(base: &Path, file: &str) -> Option<String> {
    let path = base.join(file);
    match fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::error!("Cannot read template {}: {}", path.display(), e);
            None
        }
    }
}

/// Every definition file below `dir`, sorted by path.
pub fn discover_definitions(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::configuration(format!(
            "Checker directory {} does not exist",
            dir.display()
        )));
    }

    let pattern = glob::Pattern::new(DEFINITION_PATTERN)?;
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| pattern.matches(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Load every definition below `dir`; broken ones are logged and skipped.
pub fn load_definitions(dir: &Path) -> Result<Vec<Rule>> {
    let rules = discover_definitions(dir)?
        .into_iter()
        .filter_map(|path| match load_definition(&path) {
            Ok(rule) => {
                log::debug!("Loaded checker {} from {}", rule.name, path.display());
                Some(rule)
            }
            Err(e) => {
                log::error!("{}", e);
                None
            }
        })
        .collect();
    Ok(rules)
}
