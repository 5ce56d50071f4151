//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults.
//! Every section and field is optional; a missing default config file means
//! running with built-in defaults and `tokens.txt`/`proxy.txt` in the
//! working directory.

use farm_client::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use farm_worker::Timing;
use farm_worker::timing::{DEFAULT_CLAIM_CHECK_COUNT, DEFAULT_RUN_INTERVAL, DEFAULT_WAIT_TIME};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file used when neither `--config` nor CONFIG_PATH is given.
pub const DEFAULT_CONFIG_FILE: &str = "litas-bot.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub files: FilesConfig,
    pub timing: TimingConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
}

/// Account and proxy list locations
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub accounts_path: PathBuf,
    pub proxies_path: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            accounts_path: PathBuf::from("tokens.txt"),
            proxies_path: PathBuf::from("proxy.txt"),
        }
    }
}

/// Pacing of retries, accounts and cycles
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub wait_time_secs: u64,
    pub run_interval_secs: u64,
    pub claim_check_count: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_time_secs: DEFAULT_WAIT_TIME.as_secs(),
            run_interval_secs: DEFAULT_RUN_INTERVAL.as_secs(),
            claim_check_count: DEFAULT_CLAIM_CHECK_COUNT,
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            wait_time: Duration::from_secs(self.wait_time_secs),
            run_interval: Duration::from_secs(self.run_interval_secs),
            claim_check_count: self.claim_check_count,
        }
    }
}

/// Remote farming API
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Textfile exposition for node-exporter
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub textfile_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| common::Error::ConfigRead {
                path: path.to_owned(),
                source,
            })?;
        let config: Config =
            toml::from_str(&contents).map_err(|source| common::Error::ConfigParse {
                path: path.to_owned(),
                source,
            })?;
        config.finish()
    }

    /// Like `load`, but a missing file yields the defaults.
    ///
    /// Only meant for the default path: an explicitly requested file that
    /// does not exist is still an error.
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Config::default().finish()
        }
    }

    fn finish(mut self) -> common::Result<Self> {
        if let Ok(url) = std::env::var("LITAS_API_URL") {
            self.api.base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(common::Error::invalid(
                "base_url",
                format!("must start with http:// or https://, got: {}", self.api.base_url),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::invalid("timeout_secs", "must be greater than 0"));
        }

        if self.timing.run_interval_secs == 0 {
            return Err(common::Error::invalid(
                "run_interval_secs",
                "must be greater than 0",
            ));
        }

        if self.timing.claim_check_count == 0 {
            return Err(common::Error::invalid(
                "claim_check_count",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    ///
    /// The flag tells the caller whether the path was asked for explicitly.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_FILE), false)
    }
}
