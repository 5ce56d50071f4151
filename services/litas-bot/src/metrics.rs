//! Prometheus metrics exposition
//!
//! The bot serves no HTTP, so the exposition is written to a file for the
//! node-exporter textfile collector after every cycle:
//!
//! - `farm_cycles_total` (counter)
//! - `farm_account_runs_total` (counter): label `outcome`
//! - `farm_accounts` (gauge)
//! - `farm_cycle_duration_seconds` (histogram)

use std::path::{Path, PathBuf};
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::{Error, Result};

/// Cycle duration buckets: a cycle is at least one WAIT_TIME per account and
/// can stretch to hours when the remote API keeps failing.
const CYCLE_BUCKETS: &[f64] = &[
    1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0,
];

fn builder() -> std::result::Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("farm_cycle_duration_seconds".to_string()),
        CYCLE_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> std::result::Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record the outcome of one account's run: `claimed`, `deferred` or `failed`.
pub fn record_account_run(outcome: &'static str) {
    metrics::counter!("farm_account_runs_total", "outcome" => outcome).increment(1);
}

/// Record a completed cycle over `accounts` accounts.
pub fn record_cycle(accounts: usize, duration: Duration) {
    metrics::counter!("farm_cycles_total").increment(1);
    metrics::gauge!("farm_accounts").set(accounts as f64);
    metrics::histogram!("farm_cycle_duration_seconds").record(duration.as_secs_f64());
}

/// Renders the recorder into a textfile after each cycle.
pub struct TextfileExporter {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl TextfileExporter {
    pub fn new(handle: PrometheusHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current exposition, replacing the previous file atomically
    /// so the collector never scrapes a half-written file.
    pub async fn write(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Metrics("textfile path has no parent directory".into()))?;
        let tmp_path = dir.join(format!(".litas-metrics.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, self.handle.render())
            .await
            .map_err(|e| Error::Metrics(format!("writing {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Metrics(format!("renaming to {}: {e}", self.path.display())))?;
        Ok(())
    }
}
