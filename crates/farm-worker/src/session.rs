//! One account's view of the remote service for the length of a cycle

use farm_client::FarmService;
use tokio_util::sync::CancellationToken;

use crate::timing::Timing;

/// Binds an account's index and proxy to the service, pacing and shutdown
/// token. Cheap to build; the orchestrator creates one per account per cycle.
///
/// Holds no credentials: every procedure takes the current `TokenPair` and
/// hands back whichever pair is newest when it finishes.
pub struct AccountSession<'a> {
    pub(crate) service: &'a dyn FarmService,
    pub(crate) timing: &'a Timing,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) index: usize,
    pub(crate) proxy: Option<&'a str>,
}

impl<'a> AccountSession<'a> {
    pub fn new(
        service: &'a dyn FarmService,
        timing: &'a Timing,
        cancel: &'a CancellationToken,
        index: usize,
        proxy: Option<&'a str>,
    ) -> Self {
        Self {
            service,
            timing,
            cancel,
            index,
            proxy,
        }
    }

    /// 1-based account number used in log lines.
    pub(crate) fn number(&self) -> usize {
        self.index + 1
    }
}
