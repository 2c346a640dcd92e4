use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sgclean operations.
#[derive(Debug, Error)]
pub enum SgcleanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse rules file {path}: {source}")]
    RulesParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid rule pattern '{pattern}': {source}")]
    InvalidRulePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
