//! Provider error types.

use thiserror::Error;

/// Errors that can occur while talking to a tile server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The server answered with an empty body.
    #[error("Empty response from {0}")]
    EmptyResponse(String),
}
