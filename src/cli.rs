//! Command line interface for covmetrics

pub mod setup;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use setup::{configure_thread_pool, get_worker_count, init_logging};

/// Default report file name
pub const DEFAULT_REPORT: &str = "cov-metrics-report.json";

#[derive(Parser, Debug)]
#[command(name = "covmetrics")]
#[command(
    about = "Check function metrics against threshold checkers and write a cov-import-results report",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a metrics export and write the defect report
    Check(CheckArgs),

    /// List the available checkers
    ListCheckers {
        /// Directory with additional checker definitions
        #[arg(long = "config-dir")]
        config_dir: Option<PathBuf>,

        /// JSON run configuration
        #[arg(short = 'c', long = "config-file")]
        config_file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Metrics export to read (gzip or plain)
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Intermediate directory holding output<TAG>/FUNCTION.metrics.xml.gz
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Output tag inside the intermediate directory
    #[arg(long = "output-tag")]
    pub output_tag: Option<String>,

    /// JSON run configuration
    #[arg(short = 'c', long = "config-file")]
    pub config_file: Option<PathBuf>,

    /// Directory with additional checker definitions
    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,

    /// Prefix removed from displayed pathnames
    #[arg(long = "strip-path")]
    pub strip_path: Option<String>,

    /// Leave out functions whose pathname fully matches one of these patterns (comma-separated)
    #[arg(long = "exclude-pathname-regex", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Override a setting: dir, config, metrics, output, name or description
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Enable every available checker
    #[arg(long)]
    pub all: bool,

    /// Enable one checker (repeatable)
    #[arg(short = 'e', long = "enable-checker")]
    pub enable: Vec<String>,

    /// Override a threshold, as CHECKER:METRIC:THRESHOLD (repeatable)
    #[arg(long = "checker-option")]
    pub checker_options: Vec<String>,

    /// Report file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads (0 = use all cores)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    pub jobs: usize,

    /// Evaluate checkers on a single thread
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_define(text: &str) -> Result<(String, String), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", text))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", text));
    }
    Ok((key.to_string(), value.to_string()))
}
