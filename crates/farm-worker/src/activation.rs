//! Mining activation procedure
//!
//! ```text
//!   ATTEMPT ──Activated──▶ done (return current pair)
//!     │  ▲ ▲
//!     │  │ └──────── wait ◀── Failed
//!     │  └── refresh ◀────── Unauthorized
//! ```

use farm_client::{Activation, TokenPair};
use tracing::{info, warn};

use crate::error::Result;
use crate::retry::{cancellable, sleep};
use crate::session::AccountSession;

impl AccountSession<'_> {
    /// Make sure the account's mining session is running.
    ///
    /// Returns the pair in effect when activation succeeded, which is a new
    /// one whenever the service rejected the token along the way.
    pub async fn activate_mining(&self, mut tokens: TokenPair) -> Result<TokenPair> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let outcome = cancellable(
                self.cancel,
                self.service.activate_mining(tokens.access(), self.proxy),
            )
            .await?;

            match outcome {
                Ok(Activation::Activated(response)) => {
                    info!(account = self.number(), attempt, %response, "mining activated");
                    return Ok(tokens);
                }
                Ok(Activation::Unauthorized) => {
                    warn!(account = self.number(), attempt, "activation unauthorized, refreshing token");
                    tokens = self.refresh_tokens(&tokens).await?;
                }
                Ok(Activation::Failed(reason)) => {
                    info!(account = self.number(), attempt, %reason, "activation failed, retrying");
                    sleep(self.cancel, self.timing.wait_time).await?;
                }
                Err(e) if e.is_retryable() => {
                    warn!(account = self.number(), attempt, error = %e, "activation failed, retrying");
                    sleep(self.cancel, self.timing.wait_time).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Timing;
    use farm_client::testing::{Call, MockFarmService};
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn activated_returns_input_pair_untouched() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let tokens = session
            .activate_mining(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(tokens.access(), "at");
        assert_eq!(tokens.refresh(), "rt");
        assert_eq!(service.activate_calls(), 1);
        assert_eq!(service.refresh_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_refreshes_then_retries_with_new_token() {
        let service = MockFarmService::new();
        service.push_activation(Ok(Activation::Unauthorized));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 1, Some("p1"));

        let started = Instant::now();
        let tokens = session
            .activate_mining(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(tokens.access(), "at'");
        assert_eq!(tokens.refresh(), "rt'");
        assert_eq!(
            service.calls(),
            vec![
                Call::Activate {
                    token: "at".into(),
                    proxy: Some("p1".into()),
                },
                Call::Refresh {
                    token: "at".into(),
                    refresh_token: "rt".into(),
                    proxy: Some("p1".into()),
                },
                Call::Activate {
                    token: "at'".into(),
                    proxy: Some("p1".into()),
                },
            ]
        );
        assert_eq!(started.elapsed(), std::time::Duration::ZERO, "re-auth does not wait");
    }

    #[tokio::test(start_paused = true)]
    async fn failures_wait_between_attempts() {
        let service = MockFarmService::new();
        service
            .push_activation(Ok(Activation::Failed("500: boom".into())))
            .push_activation(Err(farm_client::Error::Http("timeout".into())));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let started = Instant::now();
        let tokens = session
            .activate_mining(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(tokens.access(), "at");
        assert_eq!(service.activate_calls(), 3);
        assert_eq!(service.refresh_calls(), 0);
        assert_eq!(started.elapsed(), timing.wait_time * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_most_recent_pair_across_repeated_unauthorized() {
        let service = MockFarmService::new();
        service
            .push_activation(Ok(Activation::Unauthorized))
            .push_activation(Ok(Activation::Failed("502".into())))
            .push_activation(Ok(Activation::Unauthorized));
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, None);

        let tokens = session
            .activate_mining(TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(tokens.access(), "at''");
        assert_eq!(tokens.refresh(), "rt''");
        assert_eq!(service.activate_calls(), 4);
        assert_eq!(service.refresh_calls(), 2);
    }
}
