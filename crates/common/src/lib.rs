//! Common types shared by the litas farming workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
