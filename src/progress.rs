//! Progress feedback for check runs.
//!
//! Spinners are drawn on stderr and only when it is a terminal. Quiet mode
//! (`--quiet` or `COVMETRICS_QUIET`) hides them entirely.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

pub const TEMPLATE_RECORDS: &str = "{spinner} {msg} {pos} records - {per_sec}";

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    pub quiet_mode: bool,
    pub verbosity: u8,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool, verbosity: u8) -> Self {
        let env_quiet = std::env::var("COVMETRICS_QUIET").is_ok();
        Self {
            quiet_mode: quiet || env_quiet,
            verbosity,
        }
    }

    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}

/// Coordinates the spinners of one run
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// Spinner that shows a running count; hidden when progress is not shown.
    pub fn create_counter(&self, msg: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = match ProgressStyle::default_spinner().template(TEMPLATE_RECORDS) {
            Ok(style) => style,
            Err(e) => {
                log::debug!("Invalid progress template {}: {}", TEMPLATE_RECORDS, e);
                ProgressStyle::default_spinner()
            }
        };
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(style.tick_chars(TICK_CHARS));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn verbosity(&self) -> u8 {
        self.config.verbosity
    }

    /// Clear all spinners before printing final output.
    pub fn clear(&self) -> std::io::Result<()> {
        self.multi.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_quiet_flag_hides_progress() {
        let config = ProgressConfig::from_env(true, 0);
        assert!(!config.should_show_progress());
    }

    #[test]
    fn hidden_spinners_still_count() {
        let manager = ProgressManager::new(ProgressConfig {
            quiet_mode: true,
            verbosity: 1,
        });
        let pb = manager.create_counter("Reading");
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
        assert_eq!(manager.verbosity(), 1);
    }
}
