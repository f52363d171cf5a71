//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for covmetrics operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}: {}", path.display())]
    FileSystem {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input stream could not be decoded
    #[error("Cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checker definition errors
    #[error("Checker definition error in {}: {message}", path.display())]
    CheckerDefinition { path: PathBuf, message: String },

    /// Regular expression errors
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a decode error for an input stream
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a checker definition error
    pub fn checker_definition(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CheckerDefinition {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
