//! Error types for remote farming API calls

/// Errors from remote farming API calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid proxy {0}")]
    InvalidProxy(String),
}

impl Error {
    /// Whether retrying the same call can succeed.
    ///
    /// Transport, status and decode failures are retried indefinitely by the
    /// worker procedures. A proxy descriptor that cannot be parsed stays
    /// broken no matter how often it is retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::InvalidProxy(_))
    }
}

/// Result alias for remote API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_proxy_is_permanent() {
        assert!(Error::Http("connection reset".into()).is_retryable());
        assert!(
            Error::Status {
                status: 502,
                body: "bad gateway".into()
            }
            .is_retryable()
        );
        assert!(Error::Decode("missing field `status`".into()).is_retryable());
        assert!(!Error::InvalidProxy("socks9://nope".into()).is_retryable());
    }

    #[test]
    fn status_error_display_includes_code_and_body() {
        let err = Error::Status {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.to_string(), "API returned 429: slow down");
    }
}
