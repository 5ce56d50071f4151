//! Claim procedure
//!
//! When the claim window is still closed the procedure burns through
//! `claim_check_count` polls against the clock reading taken on entry and
//! then defers to the next cycle. The clock is not read again while polling,
//! so an account whose window opens mid-poll is still deferred.

use chrono::{DateTime, Utc};
use farm_client::{ClaimReceipt, FarmInfo, TokenPair};
use tracing::info;

use crate::error::Result;
use crate::retry::{retry_until_ok, sleep};
use crate::session::AccountSession;

/// What the claim procedure did for an account this cycle.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// Rewards claimed and mining restarted with `tokens`.
    Claimed {
        receipt: ClaimReceipt,
        tokens: TokenPair,
    },
    /// Window still closed after `attempts` polls; nothing was claimed and
    /// mining was not restarted.
    Deferred { attempts: u32 },
}

impl ClaimOutcome {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ClaimOutcome::Claimed { .. } => "claimed",
            ClaimOutcome::Deferred { .. } => "deferred",
        }
    }
}

impl AccountSession<'_> {
    /// Claim rewards if the window is open, then restart mining.
    pub async fn claim_rewards(&self, farm: &FarmInfo, tokens: TokenPair) -> Result<ClaimOutcome> {
        self.claim_rewards_at(farm, tokens, Utc::now()).await
    }

    /// `claim_rewards` with an explicit clock reading.
    pub async fn claim_rewards_at(
        &self,
        farm: &FarmInfo,
        tokens: TokenPair,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let max = self.timing.claim_check_count;

        if !farm.is_claimable_at(now) {
            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                info!(
                    account = self.number(),
                    attempt = attempts,
                    max,
                    can_be_claimed_at = ?farm.can_be_claimed_at,
                    "waiting for claim window"
                );
                if attempts >= max {
                    info!(account = self.number(), "claim window still closed, retrying next cycle");
                    return Ok(ClaimOutcome::Deferred { attempts });
                }
                sleep(self.cancel, self.timing.wait_time).await?;
            }
        }

        info!(account = self.number(), "rewards claimable, claiming");
        let (access, proxy) = (tokens.access(), self.proxy);
        let service = self.service;
        let receipt = retry_until_ok(self.cancel, self.timing.wait_time, "claim", move || {
            service.claim_mining(access, proxy)
        })
        .await?;
        info!(account = self.number(), response = %receipt.0, "rewards claimed");

        let tokens = self.activate_mining(tokens).await?;
        Ok(ClaimOutcome::Claimed { receipt, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Timing;
    use chrono::Duration as ChronoDuration;
    use farm_client::Activation;
    use farm_client::testing::{Call, MockFarmService, claimable_farm, pending_farm};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn past_window_claims_immediately_then_reactivates() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, Some("p0"));

        let started = Instant::now();
        let outcome = session
            .claim_rewards(&claimable_farm(ChronoDuration::minutes(5)), TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));
        assert_eq!(started.elapsed(), Duration::ZERO, "no poll budget consumed");
        assert_eq!(
            service.calls(),
            vec![
                Call::Claim {
                    token: "at".into(),
                    proxy: Some("p0".into()),
                },
                Call::Activate {
                    token: "at".into(),
                    proxy: Some("p0".into()),
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn future_window_exhausts_poll_budget_without_claiming() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let started = Instant::now();
        let outcome = session
            .claim_rewards(&pending_farm(ChronoDuration::days(1)), TokenPair::new("at", "rt"))
            .await
            .unwrap();

        match outcome {
            ClaimOutcome::Deferred { attempts } => assert_eq!(attempts, timing.claim_check_count),
            other => panic!("expected Deferred, got {other:?}"),
        }
        assert_eq!(
            started.elapsed(),
            timing.wait_time * (timing.claim_check_count - 1),
            "one wait between each poll"
        );
        assert_eq!(service.claim_calls(), 0);
        assert_eq!(service.activate_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn window_opening_mid_poll_is_still_deferred() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        // Opens one second after entry, well inside the poll window.
        let now = Utc::now();
        let farm = FarmInfo {
            status: "FARMING".into(),
            total_mined: 3.0,
            can_be_claimed_at: Some(now + ChronoDuration::seconds(1)),
        };

        let outcome = session
            .claim_rewards_at(&farm, TokenPair::new("at", "rt"), now)
            .await
            .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Deferred { attempts: 5 }));
        assert_eq!(service.claim_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_window_claims_immediately() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let farm = FarmInfo {
            status: "IDLE".into(),
            total_mined: 0.0,
            can_be_claimed_at: None,
        };

        let started = Instant::now();
        let outcome = session
            .claim_rewards(&farm, TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(service.claim_calls(), 1);
        assert_eq!(service.activate_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_failures_are_retried_until_success() {
        let service = MockFarmService::new();
        service
            .push_claim(Err(farm_client::Error::Http("reset".into())))
            .push_claim(Err(farm_client::Error::Status {
                status: 500,
                body: String::new(),
            }));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let started = Instant::now();
        let outcome = session
            .claim_rewards(&claimable_farm(ChronoDuration::hours(1)), TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));
        assert_eq!(service.claim_calls(), 3);
        assert_eq!(service.activate_calls(), 1);
        assert_eq!(started.elapsed(), timing.wait_time * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_after_claim_returns_refreshed_pair() {
        let service = MockFarmService::new();
        service.push_activation(Ok(Activation::Unauthorized));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let outcome = session
            .claim_rewards(&claimable_farm(ChronoDuration::hours(1)), TokenPair::new("at", "rt"))
            .await
            .unwrap();

        match outcome {
            ClaimOutcome::Claimed { tokens, .. } => {
                assert_eq!(tokens.access(), "at'");
                assert_eq!(tokens.refresh(), "rt'");
            }
            other => panic!("expected Claimed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_poll_budget_is_honoured() {
        let service = MockFarmService::new();
        let timing = Timing {
            claim_check_count: 2,
            ..Timing::default()
        };
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let outcome = session
            .claim_rewards(&pending_farm(ChronoDuration::hours(3)), TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Deferred { attempts: 2 }));
    }
}
