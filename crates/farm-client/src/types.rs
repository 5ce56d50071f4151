//! Wire types for the farming API

use chrono::{DateTime, Utc};
use common::Secret;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Fresh credentials returned by the refresh endpoint.
///
/// Always supersedes whatever pair the caller held before.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }

    pub fn access(&self) -> &str {
        self.access_token.expose()
    }

    pub fn refresh(&self) -> &str {
        self.refresh_token.expose()
    }
}

/// Farming state of an account. Fetched every cycle, never persisted.
///
/// Decoding is lenient: a `canBeClaimedAt` that is null, missing or not a
/// timestamp decodes as `None`, which counts as already claimable, and a
/// null or non-numeric `totalMined` decodes as zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmInfo {
    pub status: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_mined: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub can_be_claimed_at: Option<DateTime<Utc>>,
}

impl FarmInfo {
    /// Whether rewards may be claimed at `now`. No known window means yes.
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        self.can_be_claimed_at.is_none_or(|at| at <= now)
    }
}

/// RFC 3339 string or epoch milliseconds; anything else is `None`.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// Outcome of a mining activation call.
#[derive(Debug, Clone)]
pub enum Activation {
    /// Session is active; carries the response body for logging.
    Activated(serde_json::Value),
    /// The access token was rejected, re-authenticate and try again.
    Unauthorized,
    /// Anything else; carries a reason for logging.
    Failed(String),
}

/// Response of a successful claim. The amount is not interpreted.
#[derive(Debug, Clone)]
pub struct ClaimReceipt(pub serde_json::Value);

/// The API wraps some payloads in `{"data": ...}` and returns others bare.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}
