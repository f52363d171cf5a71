use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use super::core::RunConfig;
use crate::errors::{Error, Result};

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from a JSON string
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<RunConfig, String> {
    let config = serde_json::from_str::<RunConfig>(contents)
        .map_err(|e| format!("Failed to parse run configuration: {}", e))?;

    if let Some(checker) = config.checkers.iter().find(|c| c.name.is_empty()) {
        return Err(format!(
            "Checker entry without a name ({} threshold overrides)",
            checker.thresholds.len()
        ));
    }

    for pattern in &config.excluded_files {
        regex::Regex::new(pattern)
            .map_err(|e| format!("Invalid excluded-files pattern '{}': {}", pattern, e))?;
    }

    Ok(config)
}

/// Load a run configuration file
pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let contents = read_config_file(path)
        .map_err(|e| Error::file_system("Cannot read configuration file", path, e))?;
    let config = parse_and_validate_config(&contents).map_err(Error::configuration)?;
    log::info!(
        "Loaded configuration '{}' from {}",
        config.name,
        path.display()
    );
    Ok(config)
}
