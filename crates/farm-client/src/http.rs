//! reqwest-backed implementation of `FarmService`
//!
//! One `reqwest::Client` is kept for direct connections and one per distinct
//! proxy descriptor, built lazily on first use and reused for the rest of the
//! process. Clients are cheap to clone (they share an inner `Arc`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::{ACTIVATE_PATH, CLAIM_PATH, FARM_INFO_PATH, REFRESH_PATH, USER_AGENT};
use crate::error::{Error, Result};
use crate::types::{Activation, ClaimReceipt, Envelope, FarmInfo, TokenPair};
use crate::{BoxFuture, FarmService};

/// HTTP client for the farming API.
pub struct HttpFarmClient {
    base_url: String,
    timeout: Duration,
    direct: reqwest::Client,
    proxied: Mutex<HashMap<String, reqwest::Client>>,
}

impl HttpFarmClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let direct = build_client(None, timeout)?;
        Ok(Self {
            base_url,
            timeout,
            direct,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the client for a proxy descriptor, building it on first use.
    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut cache = self.proxied.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = cache.get(proxy) {
            return Ok(client.clone());
        }

        let client = build_client(Some(proxy), self.timeout)?;
        cache.insert(proxy.to_owned(), client.clone());
        debug!(proxies_cached = cache.len(), "built proxied HTTP client");
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn refresh(&self, token: &str, refresh: &str, proxy: Option<&str>) -> Result<TokenPair> {
        let client = self.client_for(proxy)?;
        let response = client
            .post(self.url(REFRESH_PATH))
            .bearer_auth(token)
            .json(&serde_json::json!({ "refreshToken": refresh }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        decode(response, "token refresh").await
    }

    async fn activate(&self, token: &str, proxy: Option<&str>) -> Result<Activation> {
        let client = self.client_for(proxy)?;
        let response = match client
            .patch(self.url(ACTIVATE_PATH))
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Activation::Failed(format!("request failed: {e}"))),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Activation::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Ok(Activation::Failed(format!("{status}: {body}")));
        }

        // The body is only logged; an empty 2xx still means the session started.
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);
        Ok(Activation::Activated(body))
    }

    async fn farm(&self, token: &str) -> Result<FarmInfo> {
        let response = self
            .direct
            .get(self.url(FARM_INFO_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("farm info request failed: {e}")))?;

        decode(response, "farm info").await
    }

    async fn claim(&self, token: &str, proxy: Option<&str>) -> Result<ClaimReceipt> {
        let client = self.client_for(proxy)?;
        let response = client
            .patch(self.url(CLAIM_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("claim request failed: {e}")))?;

        decode::<serde_json::Value>(response, "claim")
            .await
            .map(ClaimReceipt)
    }
}

impl FarmService for HttpFarmClient {
    fn refresh_token<'a>(
        &'a self,
        token: &'a str,
        refresh_token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<TokenPair>> {
        Box::pin(self.refresh(token, refresh_token, proxy))
    }

    fn activate_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Activation>> {
        Box::pin(self.activate(token, proxy))
    }

    fn user_farm<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<FarmInfo>> {
        Box::pin(self.farm(token))
    }

    fn claim_mining<'a>(
        &'a self,
        token: &'a str,
        proxy: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ClaimReceipt>> {
        Box::pin(self.claim(token, proxy))
    }
}

/// Build a client, routing all traffic through `proxy` when given.
///
/// Descriptors without a scheme (`user:pass@host:port`) are treated as HTTP
/// proxies.
fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT);

    if let Some(proxy) = proxy {
        let url = if proxy.contains("://") {
            proxy.to_owned()
        } else {
            format!("http://{proxy}")
        };
        let proxy = reqwest::Proxy::all(&url).map_err(|e| Error::InvalidProxy(e.to_string()))?;
        return builder
            .proxy(proxy)
            .build()
            .map_err(|e| Error::InvalidProxy(e.to_string()));
    }

    builder
        .build()
        .map_err(|e| Error::Http(format!("building HTTP client: {e}")))
}

/// Turn a response into `T`, mapping non-2xx to `Error::Status`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Envelope<T>>()
        .await
        .map(Envelope::into_inner)
        .map_err(|e| Error::Decode(format!("{what}: {e}")))
}
