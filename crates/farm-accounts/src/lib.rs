//! Account and proxy lists for the farming bot
//!
//! Both lists are plain text files edited by hand:
//! - accounts: one `token|refreshToken` per line, rewritten after every cycle
//! - proxies: one descriptor per line, read once at startup
//!
//! An account's identity is its position in the file. The proxy for account
//! `i` is `proxies[i % proxies.len()]`, or a direct connection when the proxy
//! list is empty.

pub mod accounts;
pub mod error;
pub mod proxies;

pub use accounts::{Account, AccountStore};
pub use error::{Error, Result};
pub use proxies::{ProxyList, redact_proxy};
