//! Litas farming bot
//!
//! Single-binary service that, for every account in the account file:
//! 1. Refreshes the token pair and reads the farm state
//! 2. Starts the mining session
//! 3. Claims rewards once the claim window opens, then restarts mining
//!
//! Accounts are processed sequentially in cycles, one proxy per account by
//! round-robin, and the refreshed tokens are written back after each cycle.

mod config;
mod error;
mod metrics;
mod orchestrator;

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farm_accounts::{AccountStore, ProxyList};
use farm_client::HttpFarmClient;

use crate::config::Config;
use crate::metrics::TextfileExporter;
use crate::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting litas-bot");

    // Armed before any startup work so a signal while loading still exits 0.
    let cancel = CancellationToken::new();
    arm_shutdown(&cancel).context("failed to install signal handlers")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let (config_path, explicit) = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), explicit, "loading configuration");

    let config = if explicit {
        Config::load(&config_path)
    } else {
        Config::load_or_default(&config_path)
    }
    .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let timing = config.timing.to_timing();
    info!(
        base_url = %config.api.base_url,
        accounts_path = %config.files.accounts_path.display(),
        proxies_path = %config.files.proxies_path.display(),
        wait_time_secs = timing.wait_time.as_secs(),
        run_interval_secs = timing.run_interval.as_secs(),
        claim_check_count = timing.claim_check_count,
        "configuration loaded"
    );

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install metrics recorder")?;

    let store = AccountStore::new(&config.files.accounts_path);
    let mut accounts = store
        .load()
        .await
        .with_context(|| format!("failed to load accounts from {}", store.path().display()))?;
    if cancel.is_cancelled() {
        return Ok(());
    }
    if accounts.is_empty() {
        warn!("no accounts found, exiting");
        return Ok(());
    }
    info!(accounts = accounts.len(), "running with accounts");

    let proxies = ProxyList::load(&config.files.proxies_path)
        .await
        .with_context(|| {
            format!(
                "failed to load proxies from {}",
                config.files.proxies_path.display()
            )
        })?;
    if cancel.is_cancelled() {
        return Ok(());
    }
    if proxies.is_empty() {
        warn!("no proxies found, running without proxy");
    }

    let client = HttpFarmClient::new(&config.api.base_url, config.api.timeout())
        .context("failed to build HTTP client")?;

    let mut orchestrator = Orchestrator::new(Arc::new(client), store, proxies, timing, cancel.clone());
    if let Some(path) = &config.metrics.textfile_path {
        info!(path = %path.display(), "writing metrics textfile after each cycle");
        orchestrator = orchestrator.with_exporter(TextfileExporter::new(prometheus_handle, path));
    }

    // A signal exits right away: the account file is only ever written at
    // the end of a full cycle, so an interrupted cycle is dropped.
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        result = orchestrator.run(&mut accounts) => {
            if let Err(e) = result {
                error!(error = %e, "run loop stopped");
                return Err(e.into());
            }
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Register SIGINT/SIGTERM handlers now and cancel `cancel` when either
/// arrives.
fn arm_shutdown(cancel: &CancellationToken) -> std::io::Result<()> {
    let signal = shutdown_signal()?;
    let cancel = cancel.clone();
    tokio::spawn(async move {
        signal.await;
        cancel.cancel();
    });
    Ok(())
}

/// Installs the handlers eagerly; the returned future resolves on the first
/// signal.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => warn!("received SIGINT, cleaning up and exiting"),
            _ = terminate.recv() => warn!("received SIGTERM, cleaning up and exiting"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => warn!("received Ctrl+C, cleaning up and exiting"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    })
}
