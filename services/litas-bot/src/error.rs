//! Service-specific error types

use thiserror::Error;

/// Errors raised by the run loop and its exporters.
///
/// Per-account failures never reach this type: the orchestrator logs them
/// and moves on to the next account.
#[derive(Error, Debug)]
pub enum Error {
    #[error("shutdown requested")]
    Cancelled,

    #[error("metrics export: {0}")]
    Metrics(String),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
