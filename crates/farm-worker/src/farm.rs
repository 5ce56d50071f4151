//! Farm status procedure

use farm_client::{FarmInfo, TokenPair};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::retry::{cancellable, sleep};
use crate::session::AccountSession;

impl AccountSession<'_> {
    /// Refresh the token pair, then read the farm state with the new token.
    ///
    /// The refresh is unconditional: the farm endpoint only accepts a freshly
    /// minted token, so every attempt (including retries) starts with one.
    /// Returns the farm state together with the pair that fetched it.
    pub async fn fetch_farm(&self, mut tokens: TokenPair) -> Result<(FarmInfo, TokenPair)> {
        loop {
            debug!(account = self.number(), "refreshing token before farm fetch");
            tokens = self.refresh_tokens(&tokens).await?;

            match cancellable(self.cancel, self.service.user_farm(tokens.access())).await? {
                Ok(farm) => {
                    info!(
                        account = self.number(),
                        status = %farm.status,
                        total_mined = farm.total_mined,
                        can_be_claimed_at = ?farm.can_be_claimed_at,
                        "farm info"
                    );
                    return Ok((farm, tokens));
                }
                Err(e) if e.is_retryable() => {
                    warn!(account = self.number(), error = %e, "farm info fetch failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
            sleep(self.cancel, self.timing.wait_time).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Timing;
    use farm_client::testing::{Call, MockFarmService, pending_farm};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn refreshes_before_fetching() {
        let service = MockFarmService::new();
        service.push_farm(Ok(pending_farm(chrono::Duration::hours(2))));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let (farm, tokens) = session
            .fetch_farm(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(farm.status, "FARMING");
        assert_eq!(tokens.access(), "at'");
        let calls = service.calls();
        assert!(matches!(calls[0], Call::Refresh { .. }));
        assert_eq!(calls[1], Call::UserFarm { token: "at'".into() });
        assert_eq!(calls.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_repeats_refresh_then_fetch() {
        let service = MockFarmService::new();
        service.push_farm(Err(farm_client::Error::Decode("truncated body".into())));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 2, None);

        let (_, tokens) = session
            .fetch_farm(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        let tokens_seen: Vec<_> = service.calls().iter().map(|c| c.token().to_owned()).collect();
        assert_eq!(tokens_seen, vec!["at", "at'", "at'", "at''"]);
        assert_eq!(service.refresh_calls(), 2);
        assert_eq!(service.farm_calls(), 2);
        assert_eq!(tokens.access(), "at''");
        assert_eq!(tokens.refresh(), "rt''");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let err = session
            .fetch_farm(TokenPair::new("at", "rt"))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::Error::Cancelled));
    }
}
