//! Cycle loop over all accounts
//!
//! Accounts are processed one at a time, in file order, each through
//! farm status -> activation -> claim. The in-memory account list has a
//! single writer (this loop) and is only touched between steps, so it needs
//! no synchronization. A concurrent version would have to revisit that.

use std::sync::Arc;
use std::time::Instant;

use farm_accounts::{Account, AccountStore, ProxyList, redact_proxy};
use farm_client::{FarmService, TokenPair};
use farm_worker::retry::sleep;
use farm_worker::{AccountSession, ClaimOutcome, Timing};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::error::{Error, Result};
use crate::metrics::{self, TextfileExporter};

/// Per-cycle tally, logged at the end of each cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub claimed: usize,
    pub deferred: usize,
    pub failed: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &ClaimOutcome) {
        match outcome {
            ClaimOutcome::Claimed { .. } => self.claimed += 1,
            ClaimOutcome::Deferred { .. } => self.deferred += 1,
        }
        metrics::record_account_run(outcome.label());
    }

    fn record_failure(&mut self) {
        self.failed += 1;
        metrics::record_account_run("failed");
    }
}

pub struct Orchestrator {
    service: Arc<dyn FarmService>,
    store: AccountStore,
    proxies: ProxyList,
    timing: Timing,
    cancel: CancellationToken,
    exporter: Option<TextfileExporter>,
}

impl Orchestrator {
    pub fn new(
        service: Arc<dyn FarmService>,
        store: AccountStore,
        proxies: ProxyList,
        timing: Timing,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            store,
            proxies,
            timing,
            cancel,
            exporter: None,
        }
    }

    pub fn with_exporter(mut self, exporter: TextfileExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Run cycles until cancelled.
    ///
    /// The account list is persisted after every completed cycle. A
    /// cancelled cycle is abandoned without persisting.
    pub async fn run(&self, accounts: &mut [Account]) -> Result<()> {
        loop {
            let cycle_id = format!("cycle_{}", uuid::Uuid::new_v4().simple());
            let span = info_span!("cycle", cycle_id = %cycle_id);

            match self.run_cycle(accounts).instrument(span.clone()).await {
                Ok(_) => self.persist(accounts).instrument(span).await,
                Err(Error::Cancelled) => {
                    info!("cycle interrupted, exiting without saving");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            info!(
                minutes = self.timing.run_interval.as_secs() / 60,
                "all accounts processed, waiting before next run"
            );
            if sleep(&self.cancel, self.timing.run_interval).await.is_err() {
                return Ok(());
            }
        }
    }

    /// One pass over every account. Returns `Error::Cancelled` if the
    /// shutdown token fires mid-cycle; per-account failures are only counted.
    pub async fn run_cycle(&self, accounts: &mut [Account]) -> Result<CycleReport> {
        let started = Instant::now();
        let total = accounts.len();
        let mut report = CycleReport::default();

        for (index, account) in accounts.iter_mut().enumerate() {
            let proxy = self.proxies.for_index(index);
            info!(
                account = index + 1,
                total,
                proxy = %proxy.map(redact_proxy).unwrap_or_else(|| "none".into()),
                "processing account"
            );

            match self.process_account(index, proxy, account.tokens()).await {
                Ok((outcome, tokens)) => {
                    account.adopt(tokens);
                    report.record(&outcome);
                }
                Err(farm_worker::Error::Cancelled) => return Err(Error::Cancelled),
                Err(farm_worker::Error::Remote(e)) => {
                    error!(account = index + 1, error = %e, "account failed, keeping previous tokens");
                    report.record_failure();
                }
            }

            sleep(&self.cancel, self.timing.wait_time)
                .await
                .map_err(|_| Error::Cancelled)?;
        }

        let elapsed = started.elapsed();
        metrics::record_cycle(total, elapsed);
        info!(
            claimed = report.claimed,
            deferred = report.deferred,
            failed = report.failed,
            elapsed_secs = elapsed.as_secs(),
            "cycle complete"
        );
        Ok(report)
    }

    /// Farm status, activation and claim for one account.
    ///
    /// Returns the newest token pair on success. On error nothing is
    /// returned, so the caller keeps the pair it started with.
    async fn process_account(
        &self,
        index: usize,
        proxy: Option<&str>,
        tokens: TokenPair,
    ) -> farm_worker::Result<(ClaimOutcome, TokenPair)> {
        let session = AccountSession::new(
            self.service.as_ref(),
            &self.timing,
            &self.cancel,
            index,
            proxy,
        );

        let (farm, tokens) = session.fetch_farm(tokens).await?;
        let tokens = session.activate_mining(tokens).await?;
        let outcome = session.claim_rewards(&farm, tokens.clone()).await?;
        let tokens = match &outcome {
            ClaimOutcome::Claimed { tokens, .. } => tokens.clone(),
            ClaimOutcome::Deferred { .. } => tokens,
        };
        Ok((outcome, tokens))
    }

    /// Save accounts and metrics. Failures are logged; the in-memory list
    /// stays authoritative and the next cycle tries again.
    async fn persist(&self, accounts: &[Account]) {
        if let Err(e) = self.store.save(accounts).await {
            error!(path = %self.store.path().display(), error = %e, "failed to save accounts");
        }
        if let Some(exporter) = &self.exporter
            && let Err(e) = exporter.write().await
        {
            warn!(path = %exporter.path().display(), error = %e, "failed to write metrics textfile");
        }
    }
}
