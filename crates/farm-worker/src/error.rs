//! Error types for the per-account procedures

/// Errors that end a per-account procedure.
///
/// Retryable remote failures never show up here; they are absorbed by the
/// retry loops.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cancelled")]
    Cancelled,

    #[error("remote call failed: {0}")]
    Remote(#[from] farm_client::Error),
}

/// Result alias for the per-account procedures.
pub type Result<T> = std::result::Result<T, Error>;
