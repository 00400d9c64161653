//! JSON-over-HTTP transport.
//!
//! Adapters build [`ApiRequest`]s and send them through an [`ApiClient`], which
//! attaches the fixed `Accept` header and a `User-Agent` from the identity
//! provider. The [`Transport`] underneath is reqwest in production and a
//! closure ([`FnTransport`]) for fixtures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::identity::IdentityProvider;

/// Connection and request timeouts for the reqwest transport.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// One GET request: URL, query parameters (in order) and extra headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    /// First query value for `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First header value for `key` (case-insensitive)
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Issues a GET and returns the parsed JSON body.
///
/// Implementations make a single attempt; retries live in the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, req: &ApiRequest) -> Result<Value, FetchError>;
}

/// reqwest-backed transport with connection pooling.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(8)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, req: &ApiRequest) -> Result<Value, FetchError> {
        let mut builder = self.client.get(&req.url).query(&req.query);
        for (key, value) in &req.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(FetchError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))
    }
}

/// Transport answering from a closure; used for fixtures and offline replays.
pub struct FnTransport<F>(pub F);

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(&ApiRequest) -> Result<Value, FetchError> + Send + Sync,
{
    async fn get_json(&self, req: &ApiRequest) -> Result<Value, FetchError> {
        (self.0)(req)
    }
}

/// Transport plus identity: what every adapter holds.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            transport,
            identity,
        }
    }

    /// Send `req` with `Accept: application/json` and a fresh `User-Agent`.
    pub async fn get_json(&self, req: ApiRequest) -> Result<Value, FetchError> {
        let req = req
            .header("Accept", "application/json")
            .header("User-Agent", self.identity.user_agent());
        log::trace!("GET {} {:?}", req.url, req.query);
        self.transport.get_json(&req).await
    }
}
