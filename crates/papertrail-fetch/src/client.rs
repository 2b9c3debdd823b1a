//! Catalog client: one paced, retrying read-only query per call.

use std::sync::Arc;

use papertrail_core::{Error, PipelineConfig, Result, RetryPolicy};
use tracing::{debug, warn};

use crate::pacing::{Clock, IntervalGate, SystemClock};
use crate::query::{Filter, PARAM_FILTER, PARAM_MAILTO};
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use crate::types::CatalogResponse;

/// Client for the bibliographic catalog.
///
/// Every request carries the `mailto` identification token and passes
/// through the politeness gate. A 429 costs one attempt plus the configured
/// cooldown; any other failure costs one attempt plus exponential backoff.
pub struct CatalogClient {
    base_url: String,
    mailto: String,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    gate: IntervalGate,
}

impl CatalogClient {
    /// Production client: pooled reqwest transport and wall-clock timing.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.retry.request_timeout())?;
        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(SystemClock::new()),
        ))
    }

    /// Client over an explicit transport and clock (tests, dry runs).
    pub fn with_parts(
        config: &PipelineConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
            policy: config.retry.clone(),
            transport,
            clock,
            gate: IntervalGate::new(config.retry.politeness_delay()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Run one query against `endpoint`, retrying per the policy.
    ///
    /// Fails with [`Error::FetchExhausted`] once the attempt budget is spent;
    /// a 2xx body that does not decode fails immediately.
    pub async fn perform(
        &self,
        endpoint: &str,
        filter: &Filter,
        extra_params: &[(&str, String)],
    ) -> Result<CatalogResponse> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query: Vec<(String, String)> = Vec::with_capacity(extra_params.len() + 2);
        if !filter.is_empty() {
            query.push((PARAM_FILTER.to_string(), filter.to_string()));
        }
        for (name, value) in extra_params {
            query.push((name.to_string(), value.clone()));
        }
        query.push((PARAM_MAILTO.to_string(), self.mailto.clone()));

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_status = None;

        for attempt in 0..max_attempts {
            let outcome = self.attempt(&url, &query).await;
            let is_last = attempt + 1 == max_attempts;

            let error = match outcome {
                Ok(raw) => match classify(raw, &self.policy) {
                    Ok(body) => {
                        debug!("{} filter={} ok on attempt {}", endpoint, filter, attempt + 1);
                        return Ok(serde_json::from_str(&body)?);
                    }
                    Err((status, error)) => {
                        last_status = Some(status);
                        error
                    }
                },
                Err(error) => error,
            };

            let wait = match &error {
                Error::RateLimited { cooldown } => *cooldown,
                _ => self.policy.backoff(attempt),
            };
            warn!(
                "{} attempt {}/{} failed: {}",
                endpoint,
                attempt + 1,
                max_attempts,
                error
            );
            if !is_last {
                self.clock.sleep(wait).await;
            }
        }

        Err(Error::FetchExhausted {
            endpoint: endpoint.to_string(),
            attempts: max_attempts,
            last_status,
        })
    }

    /// One gated GET. The gate is released whatever the outcome.
    async fn attempt(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        self.gate.wait(self.clock.as_ref()).await;
        let outcome = self.transport.get(url, query).await;
        self.gate.release(self.clock.as_ref());
        outcome
    }
}

/// Split a completed exchange into a usable body or a retryable error.
fn classify(raw: RawResponse, policy: &RetryPolicy) -> std::result::Result<String, (u16, Error)> {
    if raw.is_success() {
        return Ok(raw.body);
    }
    let error = if raw.status == 429 {
        Error::RateLimited {
            cooldown: policy.rate_limit_cooldown(),
        }
    } else {
        Error::Transport(format!("HTTP {}", raw.status))
    };
    Err((raw.status, error))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pacing::VirtualClock;
    use crate::query::{PARAM_PER_PAGE, WORKS};
    use crate::transport::{query_value, StubTransport};

    fn config() -> PipelineConfig {
        PipelineConfig {
            mailto: "team@example.org".into(),
            base_url: "https://catalog.test/".into(),
            ..Default::default()
        }
    }

    fn client(stub: Arc<StubTransport>, clock: Arc<VirtualClock>) -> CatalogClient {
        CatalogClient::with_parts(&config(), stub, clock)
    }

    #[tokio::test]
    async fn test_appends_identification_token() {
        let stub = Arc::new(StubTransport::scripted(vec![Ok(RawResponse::ok(
            r#"{"meta":{"count":3}}"#,
        ))]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub.clone(), clock);

        let filter = Filter::new().year(2020);
        let resp = client
            .perform(WORKS, &filter, &[(PARAM_PER_PAGE, "1".into())])
            .await
            .unwrap();
        assert_eq!(resp.count().unwrap(), 3);

        let calls = stub.calls();
        assert_eq!(calls[0].0, "https://catalog.test/works");
        assert_eq!(query_value(&calls[0].1, "mailto"), Some("team@example.org"));
        assert_eq!(query_value(&calls[0].1, "filter"), Some("publication_year:2020"));
        assert_eq!(query_value(&calls[0].1, "per-page"), Some("1"));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success_waits_cooldown() {
        let stub = Arc::new(StubTransport::scripted(vec![
            Ok(RawResponse::status(429)),
            Ok(RawResponse::ok(r#"{"meta":{"count":11}}"#)),
        ]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub.clone(), clock.clone());

        let resp = client.perform(WORKS, &Filter::new(), &[]).await.unwrap();
        assert_eq!(resp.count().unwrap(), 11);
        assert_eq!(stub.call_count(), 2);
        assert!(clock.now() >= Duration::from_secs(10));
        assert_eq!(clock.sleeps()[0], Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_server_errors_back_off_exponentially() {
        let stub = Arc::new(StubTransport::scripted(vec![
            Ok(RawResponse::status(500)),
            Ok(RawResponse::status(502)),
            Ok(RawResponse::ok(r#"{"group_by":[]}"#)),
        ]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub, clock.clone());

        let resp = client.perform(WORKS, &Filter::new(), &[]).await.unwrap();
        assert!(resp.groups().unwrap().is_empty());
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1100), Duration::from_millis(2100)]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_carries_last_status() {
        let stub = Arc::new(StubTransport::scripted(vec![
            Ok(RawResponse::status(500)),
            Ok(RawResponse::status(429)),
        ]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub.clone(), clock);

        let err = client.perform(WORKS, &Filter::new(), &[]).await.unwrap_err();
        match err {
            Error::FetchExhausted {
                attempts,
                last_status,
                ..
            } => {
                assert_eq!(attempts, 5);
                assert_eq!(last_status, Some(429));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(stub.call_count(), 5);
    }

    #[tokio::test]
    async fn test_transport_errors_have_no_status() {
        let stub = Arc::new(StubTransport::scripted(vec![Err(Error::Transport(
            "timed out".into(),
        ))]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub, clock);

        let err = client.perform(WORKS, &Filter::new(), &[]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::FetchExhausted {
                last_status: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_politeness_delay_between_calls() {
        let stub = Arc::new(StubTransport::scripted(vec![Ok(RawResponse::ok(
            r#"{"meta":{"count":1}}"#,
        ))]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub, clock.clone());

        client.perform(WORKS, &Filter::new(), &[]).await.unwrap();
        client.perform(WORKS, &Filter::new(), &[]).await.unwrap();
        client.perform(WORKS, &Filter::new(), &[]).await.unwrap();

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(200), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_undecodable_success_is_terminal() {
        let stub = Arc::new(StubTransport::scripted(vec![Ok(RawResponse::ok("<html>"))]));
        let clock = Arc::new(VirtualClock::new());
        let client = client(stub.clone(), clock);

        let err = client.perform(WORKS, &Filter::new(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_against_http_server() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"meta":{"count":5}}"#))
            .mount(&server)
            .await;

        let config = PipelineConfig {
            base_url: server.uri(),
            ..config()
        };
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap());
        let clock = Arc::new(VirtualClock::new());
        let client = CatalogClient::with_parts(&config, transport, clock.clone());

        let resp = client.perform(WORKS, &Filter::new(), &[]).await.unwrap();
        assert_eq!(resp.count().unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10)]);
    }
}
