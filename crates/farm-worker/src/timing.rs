//! Delays and bounds that pace the bot

use std::time::Duration;

/// Pause between retries and between accounts (WAIT_TIME).
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(3);

/// Pause between cycles (RUN_INTERVAL).
pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Claim-window polls before deferring to the next cycle (CLAIM_CHECK_COUNT).
pub const DEFAULT_CLAIM_CHECK_COUNT: u32 = 5;

/// Pacing for one bot instance. Passed in at construction, never global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub wait_time: Duration,
    pub run_interval: Duration,
    pub claim_check_count: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wait_time: DEFAULT_WAIT_TIME,
            run_interval: DEFAULT_RUN_INTERVAL,
            claim_check_count: DEFAULT_CLAIM_CHECK_COUNT,
        }
    }
}
