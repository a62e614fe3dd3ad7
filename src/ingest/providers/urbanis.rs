//! Reachability check for enrichment sources with no confirmed export schema
//! (Urbanis). Nothing is imported; the health status reflects the endpoint.
//!
//! `manual` while no endpoint is configured, `stale` when the configured
//! endpoint fails or returns nothing usable, `live` on a JSON payload.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{PayloadError, SourceAdapter, SyncResult};

/// Keys under which list-style APIs usually nest their rows.
const RECORD_KEYS: &[&str] = &["records", "data", "items", "features", "result", "response"];

/// Shape of the fetched payload, validated once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrbanisPayload {
    /// A list of records (top-level array or nested under a known key).
    Records(usize),
    /// A single non-empty JSON object.
    Document,
}

impl UrbanisPayload {
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        match value {
            Value::Array(rows) if rows.is_empty() => Err(PayloadError::Empty),
            Value::Array(rows) => Ok(UrbanisPayload::Records(rows.len())),
            Value::Object(map) if map.is_empty() => Err(PayloadError::Empty),
            Value::Object(map) => {
                let nested = RECORD_KEYS.iter().find_map(|k| match map.get(*k)? {
                    Value::Array(rows) if !rows.is_empty() => Some(rows.len()),
                    Value::Object(inner) => RECORD_KEYS.iter().find_map(|k| match inner.get(*k) {
                        Some(Value::Array(rows)) if !rows.is_empty() => Some(rows.len()),
                        _ => None,
                    }),
                    _ => None,
                });
                Ok(nested.map_or(UrbanisPayload::Document, UrbanisPayload::Records))
            }
            Value::Null => Err(PayloadError::Empty),
            other => Err(PayloadError::Malformed(format!(
                "expected object or array, got {other}"
            ))),
        }
    }
}

const SOURCE_ID: &str = "urbanis";
const SOURCE_URL: &str = "https://urbandata.theurbanis.com";

pub struct UrbanisAdapter {
    endpoint: String,
    fetcher: Fetcher,
}

impl UrbanisAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            endpoint: cfg.urbanis_endpoint.trim().to_string(),
            fetcher,
        }
    }

    async fn fetch_payload(&self) -> Result<UrbanisPayload, PayloadError> {
        if self.endpoint.is_empty() {
            return Err(PayloadError::NotConfigured);
        }
        let value: Value = self.fetcher.json(&self.endpoint).await?;
        UrbanisPayload::from_json(&value)
    }
}

#[async_trait]
impl SourceAdapter for UrbanisAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        let result = match self.fetch_payload().await {
            Ok(UrbanisPayload::Records(n)) => SyncResult::live(
                SOURCE_ID,
                format!("Urbanis endpoint fetched successfully ({n} records)."),
                SOURCE_URL,
            ),
            Ok(UrbanisPayload::Document) => {
                SyncResult::live(SOURCE_ID, "Urbanis endpoint fetched successfully.", SOURCE_URL)
            }
            Err(PayloadError::NotConfigured) => SyncResult::manual(
                SOURCE_ID,
                "Urbanis remains an enrichment source until a stable export or API URL is defined.",
                SOURCE_URL,
            ),
            Err(e) => {
                tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "reachability check failed");
                SyncResult::new(
                    SOURCE_ID,
                    e.status(),
                    format!("Configured Urbanis endpoint failed ({e}), keeping source in standby."),
                    SOURCE_URL,
                )
            }
        };
        Ok(result)
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
