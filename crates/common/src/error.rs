//! Errors raised while loading the bot's configuration

use std::path::PathBuf;

use thiserror::Error;

/// Config loading error. Each variant names the file or field at fault so
/// startup failures point straight at the line to fix.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Error {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_value_names_the_field() {
        let err = Error::invalid("claim_check_count", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid value for claim_check_count: must be greater than 0"
        );
    }

    #[test]
    fn read_error_names_the_path_and_keeps_the_cause() {
        let err = Error::ConfigRead {
            path: PathBuf::from("/etc/litas-bot.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/litas-bot.toml"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn parse_error_names_the_path() {
        let source = toml::from_str::<toml::Table>("timing = {").unwrap_err();
        let err = Error::ConfigParse {
            path: PathBuf::from("litas-bot.toml"),
            source,
        };
        assert!(err.to_string().starts_with("cannot parse config file \"litas-bot.toml\""));
    }
}
