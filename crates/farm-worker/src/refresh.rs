//! Token refresh procedure

use farm_client::TokenPair;
use tracing::info;

use crate::error::Result;
use crate::retry::retry_until_ok;
use crate::session::AccountSession;

impl AccountSession<'_> {
    /// Exchange `tokens` for a fresh pair, retrying until the service answers.
    ///
    /// Every failure is treated as transient except an unusable proxy.
    pub async fn refresh_tokens(&self, tokens: &TokenPair) -> Result<TokenPair> {
        let (access, refresh, proxy) = (tokens.access(), tokens.refresh(), self.proxy);
        let service = self.service;

        let fresh = retry_until_ok(self.cancel, self.timing.wait_time, "token refresh", move || {
            service.refresh_token(access, refresh, proxy)
        })
        .await?;

        info!(account = self.number(), "token refreshed");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::timing::Timing;
    use farm_client::testing::{Call, MockFarmService};
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn retries_until_refresh_succeeds() {
        let service = MockFarmService::new();
        for _ in 0..4 {
            service.push_refresh(Err(farm_client::Error::Status {
                status: 502,
                body: "bad gateway".into(),
            }));
        }
        service.push_refresh(Ok(TokenPair::new("at_fresh", "rt_fresh")));

        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, Some("http://p0:8080"));

        let started = Instant::now();
        let fresh = session
            .refresh_tokens(&TokenPair::new("at", "rt"))
            .await
            .unwrap();

        assert_eq!(service.refresh_calls(), 5, "4 failures + 1 success");
        assert_eq!(fresh.access(), "at_fresh");
        assert_eq!(fresh.refresh(), "rt_fresh");
        assert_eq!(started.elapsed(), timing.wait_time * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn sends_current_pair_and_proxy() {
        let service = MockFarmService::new();
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 3, Some("http://p1:8080"));

        session
            .refresh_tokens(&TokenPair::new("at_3", "rt_3"))
            .await
            .unwrap();

        assert_eq!(
            service.calls(),
            vec![Call::Refresh {
                token: "at_3".into(),
                refresh_token: "rt_3".into(),
                proxy: Some("http://p1:8080".into()),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_proxy_is_not_retried() {
        let service = MockFarmService::new();
        service.break_refresh_token("rt");
        let timing = Timing::default();
        let cancel = CancellationToken::new();
        let session = AccountSession::new(&service, &timing, &cancel, 0, Some("bogus"));

        let err = session
            .refresh_tokens(&TokenPair::new("at", "rt"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote(_)), "got: {err:?}");
        assert_eq!(service.refresh_calls(), 1);
    }
}
