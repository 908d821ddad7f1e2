//! CLI error type.

use thiserror::Error;

use marsfix::config::ConfigError;
use marsfix::logging::LoggingError;
use marsfix::CoordError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fix on line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}
