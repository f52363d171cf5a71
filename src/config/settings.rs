//! Settings for one check run, merged from the run configuration file,
//! `-D KEY=VALUE` overrides and explicit command line flags (in increasing
//! order of precedence).

use super::core::RunConfig;
use super::loader::load_run_config;
use crate::cli::{CheckArgs, DEFAULT_REPORT};
use crate::core::{Measurable, Unit};
use crate::errors::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// File name of the metrics export inside an intermediate directory
pub const METRICS_FILE_NAME: &str = "FUNCTION.metrics.xml.gz";

/// Excludes units whose sources fully match one of a set of patterns.
#[derive(Debug, Clone, Default)]
pub struct PathnameFilter {
    patterns: Vec<Regex>,
}

impl PathnameFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(|p| {
                log::info!("Functions in files matching {} are ignored", p);
                Regex::new(&format!("^(?:{})$", p))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, unit: &Unit) -> bool {
        let label = unit.sources_label();
        let excluded = self.patterns.iter().any(|p| p.is_match(&label));
        if excluded {
            log::debug!("Function metrics from {} are filtered out", label);
        }
        excluded
    }
}

/// Everything a check run needs to know.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub name: String,
    pub description: String,
    pub metrics_file: PathBuf,
    pub checker_dir: Option<PathBuf>,
    pub report_file: PathBuf,
    pub strip_path: Option<String>,
    pub filter: PathnameFilter,
    pub run_config: RunConfig,
    pub enable_all: bool,
    pub enable: Vec<String>,
    pub checker_options: Vec<String>,
    pub jobs: usize,
    pub parallel: bool,
    pub quiet: bool,
}

/// Settings fields that `-D` can override.
#[derive(Debug, Default)]
struct Overridable {
    name: String,
    description: String,
    dir: Option<PathBuf>,
    checker_dir: Option<PathBuf>,
    metrics: Option<PathBuf>,
    output_tag: String,
}

impl Overridable {
    fn from_run_config(config: &RunConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            dir: config.dir.clone(),
            checker_dir: config.config.clone(),
            metrics: None,
            output_tag: config.output.clone(),
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => self.name = value.to_string(),
            "description" => self.description = value.to_string(),
            "dir" => self.dir = Some(PathBuf::from(value)),
            "config" => self.checker_dir = Some(PathBuf::from(value)),
            "metrics" => self.metrics = Some(PathBuf::from(value)),
            "output" => self.output_tag = value.to_string(),
            other => {
                return Err(Error::configuration(format!(
                    "Unknown setting '{}' in -D override",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Location of the metrics export in an intermediate directory.
pub fn metrics_file_in(dir: &Path, output_tag: &str) -> PathBuf {
    dir.join(format!("output{}", output_tag))
        .join(METRICS_FILE_NAME)
}

impl CheckSettings {
    /// Resolve settings from command line arguments, loading the run
    /// configuration file they name.
    pub fn from_args(args: &CheckArgs) -> Result<Self> {
        let run_config = match &args.config_file {
            Some(path) => load_run_config(path)?,
            None => RunConfig::default(),
        };
        Self::resolve(args, run_config)
    }

    /// Resolve settings from command line arguments and an already loaded
    /// run configuration.
    pub fn resolve(args: &CheckArgs, run_config: RunConfig) -> Result<Self> {
        let mut values = Overridable::from_run_config(&run_config);
        for (key, value) in &args.defines {
            values.apply(key, value)?;
        }

        if let Some(dir) = &args.dir {
            values.dir = Some(dir.clone());
        }
        if let Some(tag) = &args.output_tag {
            values.output_tag = tag.clone();
        }
        if let Some(dir) = &args.config_dir {
            values.checker_dir = Some(dir.clone());
        }

        let metrics_file = args
            .metrics
            .clone()
            .or(values.metrics)
            .or_else(|| {
                values
                    .dir
                    .as_deref()
                    .map(|dir| metrics_file_in(dir, &values.output_tag))
            })
            .ok_or_else(|| {
                Error::configuration("No metrics file: use --metrics or --dir")
            })?;

        let strip_path = args
            .strip_path
            .clone()
            .or_else(|| Some(run_config.strip_path.clone()))
            .filter(|prefix| !prefix.is_empty());

        let patterns: Vec<&str> = run_config
            .excluded_files
            .iter()
            .map(String::as_str)
            .chain(args.exclude.iter().map(String::as_str))
            .collect();
        let filter = PathnameFilter::new(&patterns)?;

        Ok(Self {
            name: values.name,
            description: values.description,
            metrics_file,
            checker_dir: values.checker_dir,
            report_file: args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT)),
            strip_path,
            filter,
            run_config,
            enable_all: args.all,
            enable: args.enable.clone(),
            checker_options: args.checker_options.clone(),
            jobs: args.jobs,
            parallel: !args.no_parallel,
            quiet: args.quiet,
        })
    }
}
