//! CLI error type.

use thiserror::Error;
use tilemosaic::config::ConfigError;
use tilemosaic::coord::CoordError;
use tilemosaic::logging::LoggingError;
use tilemosaic::provider::ProviderError;
use tilemosaic::service::ServiceError;
use tilemosaic::zoom::ZoomError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to clear cache: {0}")]
    CacheClear(String),

    #[error("Failed to read cache statistics: {0}")]
    CacheStats(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to read {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(String),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Zoom(#[from] ZoomError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
