//! Scripted `FarmService` for tests
//!
//! Each operation pops its next response from a queue; once a queue is empty
//! the operation falls back to a default success. Every call is recorded so
//! tests can assert on call order, tokens and proxy assignment.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::error::{Error, Result};
use crate::types::{Activation, ClaimReceipt, FarmInfo, TokenPair};
use crate::{BoxFuture, FarmService};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Refresh {
        token: String,
        refresh_token: String,
        proxy: Option<String>,
    },
    Activate {
        token: String,
        proxy: Option<String>,
    },
    UserFarm {
        token: String,
    },
    Claim {
        token: String,
        proxy: Option<String>,
    },
}

impl Call {
    pub fn token(&self) -> &str {
        match self {
            Call::Refresh { token, .. }
            | Call::Activate { token, .. }
            | Call::UserFarm { token }
            | Call::Claim { token, .. } => token,
        }
    }
}

/// Scripted farming service.
///
/// Defaults when a queue is empty:
/// - refresh appends `'` to both tokens (`at` → `at'`), so every refresh is
///   observable in later calls
/// - activation succeeds
/// - farm info is claimable since an hour ago
/// - claim succeeds
#[derive(Default)]
pub struct MockFarmService {
    refresh: Mutex<VecDeque<Result<TokenPair>>>,
    activation: Mutex<VecDeque<Result<Activation>>>,
    farm: Mutex<VecDeque<Result<FarmInfo>>>,
    claim: Mutex<VecDeque<Result<ClaimReceipt>>>,
    broken_refresh_tokens: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
}

impl MockFarmService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_refresh(&self, response: Result<TokenPair>) -> &Self {
        lock(&self.refresh).push_back(response);
        self
    }

    pub fn push_activation(&self, response: Result<Activation>) -> &Self {
        lock(&self.activation).push_back(response);
        self
    }

    pub fn push_farm(&self, response: Result<FarmInfo>) -> &Self {
        lock(&self.farm).push_back(response);
        self
    }

    pub fn push_claim(&self, response: Result<ClaimReceipt>) -> &Self {
        lock(&self.claim).push_back(response);
        self
    }

    /// Make every refresh presenting `refresh_token` fail permanently.
    pub fn break_refresh_token(&self, refresh_token: &str) -> &Self {
        lock(&self.broken_refresh_tokens).insert(refresh_token.to_owned());
        self
    }

    /// Snapshot of all calls so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Refresh { .. }))
    }

    pub fn activate_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Activate { .. }))
    }

    pub fn farm_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::UserFarm { .. }))
    }

    pub fn claim_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Claim { .. }))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

/// Farm info that became claimable `ago` before now.
pub fn claimable_farm(ago: Duration) -> FarmInfo {
    FarmInfo {
        status: "FARMING".into(),
        total_mined: 1.5,
        can_be_claimed_at: Some(Utc::now() - ago),
    }
}

/// Farm info that becomes claimable `ahead` from now.
pub fn pending_farm(ahead: Duration) -> FarmInfo {
    FarmInfo {
        status: "FARMING".into(),
        total_mined: 0.25,
        can_be_claimed_at: Some(Utc::now() + ahead),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl FarmService for MockFarmService {
    fn refresh_token<'a>(
        &'a self,
        token: &'a str,
        refresh_token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<TokenPair>> {
        self.record(Call::Refresh {
            token: token.to_owned(),
            refresh_token: refresh_token.to_owned(),
            proxy: proxy.map(str::to_owned),
        });
        let response = if lock(&self.broken_refresh_tokens).contains(refresh_token) {
            Err(Error::InvalidProxy(format!("{} rejected", proxy.unwrap_or("direct"))))
        } else {
            lock(&self.refresh)
                .pop_front()
                .unwrap_or_else(|| Ok(TokenPair::new(format!("{token}'"), format!("{refresh_token}'"))))
        };
        Box::pin(async move { response })
    }

    fn activate_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Activation>> {
        self.record(Call::Activate {
            token: token.to_owned(),
            proxy: proxy.map(str::to_owned),
        });
        let response = lock(&self.activation)
            .pop_front()
            .unwrap_or_else(|| Ok(Activation::Activated(serde_json::json!({ "ok": true }))));
        Box::pin(async move { response })
    }

    fn user_farm<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<FarmInfo>> {
        self.record(Call::UserFarm {
            token: token.to_owned(),
        });
        let response = lock(&self.farm)
            .pop_front()
            .unwrap_or_else(|| Ok(claimable_farm(Duration::hours(1))));
        Box::pin(async move { response })
    }

    fn claim_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ClaimReceipt>> {
        self.record(Call::Claim {
            token: token.to_owned(),
            proxy: proxy.map(str::to_owned),
        });
        let response = lock(&self.claim)
            .pop_front()
            .unwrap_or_else(|| Ok(ClaimReceipt(serde_json::json!({ "claimed": 1.5 }))));
        Box::pin(async move { response })
    }
}
