//! reqwest-backed [`SearchTransport`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::SearchTransport;
use crate::{Error, Result};

/// JSON POST transport over a pooled reqwest client.
///
/// The timeout bounds the whole call; the decompiler never runs until the
/// call has completed successfully.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| Error::BackendUnavailable {
                url: String::new(),
                detail: format!("failed to build http client: {err}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn query(&self, url: &str, body: &Value) -> Result<Value> {
        debug!(%url, "dispatching facet query");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::BackendUnavailable {
                url: url.to_string(),
                detail: format!("failed to send request: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::BackendUnavailable {
                url: url.to_string(),
                detail: format!("unexpected status code {status}"),
            });
        }

        response.json().await.map_err(|err| Error::MalformedResponse {
            url: url.to_string(),
            detail: format!("failed to decode response body: {err}"),
        })
    }
}
