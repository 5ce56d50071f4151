//! Error types for account and proxy file operations

/// Errors from account and proxy file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("malformed account on line {line}: {reason}")]
    MalformedAccount { line: usize, reason: String },
}

/// Result alias for account and proxy file operations.
pub type Result<T> = std::result::Result<T, Error>;
