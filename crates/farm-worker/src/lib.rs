//! Per-account farming procedures
//!
//! An `AccountSession` binds one account's proxy to the remote service and
//! exposes the procedures the orchestrator runs in order every cycle:
//!
//! 1. `fetch_farm`: refresh the token pair, then read the farm state
//! 2. `activate_mining`: start mining, re-authenticating on `Unauthorized`
//! 3. `claim_rewards`: poll the claim window, claim, restart mining
//!
//! Every remote call is retried without limit at a fixed `Timing::wait_time`.
//! The only ways out of a procedure are success, a non-retryable client error,
//! or cancellation of the session's `CancellationToken`.

pub mod activation;
pub mod claim;
pub mod error;
pub mod farm;
pub mod refresh;
pub mod retry;
pub mod session;
pub mod timing;

pub use claim::ClaimOutcome;
pub use error::{Error, Result};
pub use session::AccountSession;
pub use timing::Timing;
