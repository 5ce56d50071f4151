//! Remote farming service abstraction
//!
//! Defines the `FarmService` trait that decouples the per-account procedures
//! from the wire protocol. `HttpFarmClient` is the production implementation;
//! the `testing` feature adds a scripted `MockFarmService` for procedure and
//! orchestrator tests.

pub mod constants;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use error::{Error, Result};
pub use http::HttpFarmClient;
pub use types::{Activation, ClaimReceipt, FarmInfo, TokenPair};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by `FarmService` methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The four remote operations the bot needs.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn FarmService>`). Every method reports failure through `Result`;
/// whether a failure may be retried is decided by `Error::is_retryable`.
///
/// `proxy` is an opaque descriptor from the proxy list, `None` for a direct
/// connection.
pub trait FarmService: Send + Sync {
    /// Exchange the current token pair for a fresh one.
    fn refresh_token<'a>(
        &'a self,
        token: &'a str,
        refresh_token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<TokenPair>>;

    /// Start (or confirm) the account's mining session.
    ///
    /// A rejected token is reported as `Activation::Unauthorized`, a generic
    /// failure as `Activation::Failed`. `Err` is reserved for failures that
    /// are not about the remote call itself, such as an unusable proxy.
    fn activate_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Activation>>;

    /// Fetch the current farming state. Always uses a direct connection.
    fn user_farm<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<FarmInfo>>;

    /// Claim accrued rewards.
    fn claim_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ClaimReceipt>>;
}
