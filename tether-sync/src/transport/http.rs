//! HTTP replay transport with retry, exponential backoff, and timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use tether_core::config::TransportConfig;
use tether_core::errors::{SyncError, TetherResult};
use tether_core::models::ReplayResponse;
use tether_core::mutation::{HttpMethod, QueuedMutation};
use tether_core::traits::IReplayTransport;

/// Replays queued mutations as real HTTP requests against the backend.
///
/// Transport-level failures (connect, DNS, timeout) are retried with
/// doubling backoff. An HTTP status is an outcome, never retried here:
/// whether a 500 warrants another attempt is the next sync pass's call.
pub struct HttpReplayTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpReplayTransport {
    pub fn new(config: TransportConfig) -> TetherResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| SyncError::TransportError {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    /// Absolute urls pass through; relative ones join the configured base.
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if url.starts_with('/') {
            format!("{base}{url}")
        } else {
            format!("{base}/{url}")
        }
    }

    /// Recorded headers win over the JSON default.
    fn build_request(
        &self,
        url: &str,
        mutation: &QueuedMutation,
    ) -> TetherResult<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &mutation.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SyncError::InvalidMutation {
                    reason: format!("bad header name '{name}': {e}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| SyncError::InvalidMutation {
                reason: format!("bad header value for '{name}': {e}"),
            })?;
            headers.insert(name, value);
        }

        let mut req = self
            .client
            .request(to_reqwest_method(mutation.method), url)
            .headers(headers);
        if let Some(body) = &mutation.body {
            req = req.body(serde_json::to_vec(body).map_err(|e| {
                SyncError::InvalidMutation {
                    reason: format!("unserializable body: {e}"),
                }
            })?);
        }
        Ok(req)
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl IReplayTransport for HttpReplayTransport {
    async fn execute(&self, mutation: &QueuedMutation) -> TetherResult<ReplayResponse> {
        let url = self.resolve_url(&mutation.url);
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let max_backoff = Duration::from_millis(self.config.max_backoff_ms);
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "transport: retry attempt {}/{} after {:?}",
                    attempt,
                    self.config.max_retries,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }

            match self.build_request(&url, mutation)?.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let data = resp.json::<Value>().await.ok();
                    return Ok(ReplayResponse { status, data });
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(SyncError::TransportError {
            reason: format!(
                "all {} retries exhausted: {last_err}",
                self.config.max_retries
            ),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_core::mutation::MutationDraft;

    fn transport(base_url: &str) -> HttpReplayTransport {
        HttpReplayTransport::new(TransportConfig {
            base_url: base_url.to_string(),
            ..TransportConfig::default()
        })
        .unwrap()
    }

    fn queued(draft: MutationDraft) -> QueuedMutation {
        draft.into_queued(
            tether_core::mutation::MutationId::from("0000000000100-aaaaaaaa"),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn relative_urls_join_the_base() {
        let t = transport("https://erp.example.com/");
        assert_eq!(
            t.resolve_url("/api/things/3"),
            "https://erp.example.com/api/things/3"
        );
        assert_eq!(
            t.resolve_url("api/things/3"),
            "https://erp.example.com/api/things/3"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let t = transport("https://erp.example.com");
        assert_eq!(
            t.resolve_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn requests_carry_method_body_and_default_content_type() {
        let t = transport("https://erp.example.com");
        let mutation = queued(
            MutationDraft::raw(HttpMethod::Post, "/api/orders").with_body(json!({ "qty": 2 })),
        );

        let req = t
            .build_request(&t.resolve_url(&mutation.url), &mutation)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "https://erp.example.com/api/orders");
        assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(req.body().is_some());
    }

    #[test]
    fn recorded_headers_override_the_default() {
        let t = transport("https://erp.example.com");
        let mutation = queued(
            MutationDraft::raw(HttpMethod::Post, "/api/upload")
                .with_header("content-type", "application/octet-stream")
                .with_header("x-request-id", "r-17"),
        );

        let req = t
            .build_request(&t.resolve_url(&mutation.url), &mutation)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            req.headers().get(CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );
        assert_eq!(req.headers().get("x-request-id").unwrap(), "r-17");
    }

    #[test]
    fn bad_header_names_fail_loudly() {
        let t = transport("https://erp.example.com");
        let mutation = queued(
            MutationDraft::raw(HttpMethod::Post, "/api/x").with_header("bad header", "v"),
        );
        let err = t
            .build_request(&t.resolve_url(&mutation.url), &mutation)
            .unwrap_err();
        assert!(err.to_string().contains("bad header"));
    }
}
