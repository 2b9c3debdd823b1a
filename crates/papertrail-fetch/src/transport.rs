//! Outbound GET transport.
//!
//! [`ReqwestTransport`] holds one pooled `reqwest::Client` for the whole run.
//! `StubTransport` answers from a closure, for tests and dry runs; it is built
//! with the `test-util` feature.

use std::time::Duration;

use async_trait::async_trait;
use papertrail_core::{Error, Result};
#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;
use reqwest::Client;
use tracing::debug;

/// Status and body of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One read-only GET. `Err` means no HTTP status was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("papertrail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Body read failed: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(any(test, feature = "test-util"))]
type Responder = dyn Fn(&str, &[(String, String)]) -> Result<RawResponse> + Send + Sync;

/// In-memory transport answering from a closure and logging every call.
#[cfg(any(test, feature = "test-util"))]
pub struct StubTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl StubTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &[(String, String)]) -> Result<RawResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer the scripted responses in order, then repeat the last one.
    pub fn scripted(responses: Vec<Result<RawResponse>>) -> Self {
        let script = Mutex::new(responses.into_iter().collect::<std::collections::VecDeque<_>>());
        Self::new(move |_, _| {
            let mut script = script.lock();
            match script.len() {
                0 => Err(Error::Transport("script exhausted".into())),
                1 => clone_result(&script[0]),
                _ => script
                    .pop_front()
                    .unwrap_or_else(|| Err(Error::Transport("script exhausted".into()))),
            }
        })
    }

    /// Number of GETs issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Every GET issued so far, as (url, query).
    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
fn clone_result(result: &Result<RawResponse>) -> Result<RawResponse> {
    match result {
        Ok(resp) => Ok(resp.clone()),
        Err(e) => Err(Error::Transport(e.to_string())),
    }
}

/// Value of query parameter `name`, if present.
#[cfg(any(test, feature = "test-util"))]
pub fn query_value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        self.calls.lock().push((url.to_string(), query.to_vec()));
        (self.responder)(url, query)
    }
}
