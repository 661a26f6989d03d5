//! Error type for the CLI.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input file is not valid JSON for what it should contain.
    #[error("Invalid JSON in `{path}`: {source}")]
    Json {
        path: String,
        /// Full file content, kept for the error report.
        src: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("{count} collision(s) found at clearance {clearance}")]
    Collisions { count: usize, clearance: i32 },
}
