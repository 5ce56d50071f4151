//! Cancellable delays and retry-until-success
//!
//! Retries have a fixed delay and no cap: the remote service is expected to
//! come back eventually, and the process is stopped from outside when it
//! does not. The cancellation token is the only way to interrupt a loop.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Sleep for `duration` unless `cancel` fires first.
pub async fn sleep(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Drive `fut` to completion unless `cancel` fires first.
pub async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}

/// Call `op` until it succeeds, sleeping `delay` between attempts.
///
/// Retryable client errors are logged and retried; a non-retryable one is
/// returned immediately. `what` names the call in logs.
pub async fn retry_until_ok<T, F, Fut>(
    cancel: &CancellationToken,
    delay: Duration,
    what: &'static str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = farm_client::Result<T>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match cancellable(cancel, op()).await? {
            Ok(value) => {
                if attempt > 1 {
                    debug!(what, attempt, "succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() => {
                warn!(what, attempt, error = %e, "remote call failed, retrying");
            }
            Err(e) => return Err(e.into()),
        }
        sleep(cancel, delay).await?;
    }
}
