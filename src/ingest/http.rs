//! Shared upstream fetch helpers. Every call is gated on `allow_live_fetch`
//! and maps transport/status failures to `PayloadError::Unavailable`.

use metrics::counter;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::ingest::types::PayloadError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    allow_live: bool,
}

impl Fetcher {
    pub fn new(allow_live: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("city-pulse-fusion/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, allow_live }
    }

    pub fn allow_live(&self) -> bool {
        self.allow_live
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, PayloadError> {
        if !self.allow_live {
            return Err(PayloadError::Unavailable("live fetch disabled".into()));
        }
        if url.is_empty() {
            return Err(PayloadError::NotConfigured);
        }

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| {
                counter!("sync_http_errors_total").increment(1);
                tracing::debug!(target: "sync", error = ?e, url, "upstream request failed");
                PayloadError::Unavailable(e.to_string())
            })?;

        if !resp.status().is_success() {
            counter!("sync_http_errors_total").increment(1);
            return Err(PayloadError::Unavailable(format!("HTTP {}", resp.status())));
        }
        Ok(resp)
    }

    pub async fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PayloadError> {
        self.get(url, "application/json")
            .await?
            .json::<T>()
            .await
            .map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    pub async fn text(&self, url: &str) -> Result<String, PayloadError> {
        let body = self
            .get(url, "application/rss+xml, application/xml, text/xml")
            .await?
            .text()
            .await
            .map_err(|e| PayloadError::Unavailable(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(PayloadError::Empty);
        }
        Ok(body)
    }
}
