//! GISTDA disaster feed: point records into the `disaster` layer plus the
//! first few titles as resilience warnings.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::google_news_rss::clean_text;
use super::json_rows::{pick_number, pick_str, primitive_properties, Row, RowShape};
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{ResiliencePatch, SourceAdapter, SyncResult};
use crate::model::{GeoFeatureRecord, GeometryType, LocalizedText, MapFeatureCollection, SourceMeta};

const SOURCE_ID: &str = "gistda-disaster";
const SOURCE_NAME: &str = "GISTDA Disaster API";
const SOURCE_URL: &str = "https://disaster.gistda.or.th/services/open-api";
const LAYER_ID: &str = "disaster";
const MAX_FEATURES: usize = 24;
const MAX_WARNINGS: usize = 3;
const MAX_PROPERTIES: usize = 10;

const SHAPE: RowShape = RowShape {
    keys: &["features", "data", "items", "records"],
    nested: &[("result", &["features", "data", "items", "records"])],
    flatten: &["properties", "attributes"],
};

const TITLE_KEYS: &[&str] = &[
    "title", "name", "event", "event_name", "alert_name", "disaster_type", "type", "หัวข้อ",
    "ชื่อเหตุการณ์",
];
const DESCRIPTION_KEYS: &[&str] = &[
    "description", "detail", "remark", "status", "severity", "พื้นที่", "รายละเอียด",
];
const LAT_KEYS: &[&str] = &["lat", "latitude", "y", "ycoord", "coord_y"];
const LON_KEYS: &[&str] = &["lon", "lng", "longitude", "x", "xcoord", "coord_x"];

/// `(lon, lat)` from a GeoJSON point geometry or from flat coordinate fields.
fn point_of(row: &Row) -> Option<(f64, f64)> {
    let from_geometry = row.get("geometry").and_then(Value::as_object).and_then(|g| {
        let is_point = g
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("point"));
        let coords = g.get("coordinates")?.as_array()?;
        match (is_point, coords.first()?.as_f64(), coords.get(1)?.as_f64()) {
            (true, Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    });
    from_geometry.or_else(|| Some((pick_number(row, LON_KEYS)?, pick_number(row, LAT_KEYS)?)))
}

fn meta(endpoint: &str, now: DateTime<Utc>) -> SourceMeta {
    SourceMeta::live(SOURCE_NAME, endpoint, now, 0.81)
}

fn feature_from_row(row: &Row, index: usize, endpoint: &str, now: DateTime<Utc>) -> Option<GeoFeatureRecord> {
    let (lon, lat) = point_of(row)?;
    let title = pick_str(row, TITLE_KEYS)
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("GISTDA disaster signal {}", index + 1));
    let description = pick_str(row, DESCRIPTION_KEYS)
        .map(clean_text)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            "Live disaster or hazard signal imported from a configured GISTDA endpoint.".into()
        });

    Some(GeoFeatureRecord {
        id: format!("gistda-feature-{index}"),
        layer_id: LAYER_ID.into(),
        geometry_type: GeometryType::Point,
        coordinates: json!([lon, lat]),
        title,
        description: Some(description),
        properties: primitive_properties(row, MAX_PROPERTIES).into_iter().collect(),
        source: meta(endpoint, now),
    })
}

fn bounds(features: &[GeoFeatureRecord]) -> Option<[f64; 4]> {
    features
        .iter()
        .filter_map(|f| Some((f.coordinates.get(0)?.as_f64()?, f.coordinates.get(1)?.as_f64()?)))
        .fold(None, |acc, (lon, lat)| {
            Some(match acc {
                None => [lat, lon, lat, lon],
                Some([a, b, c, d]) => [a.min(lat), b.min(lon), c.max(lat), d.max(lon)],
            })
        })
}

/// Disaster layer and warnings from a fetched payload. No points keeps it stale.
pub fn build_result(payload: &Value, endpoint: &str, now: DateTime<Utc>) -> SyncResult {
    let features: Vec<GeoFeatureRecord> = SHAPE
        .extract(payload)
        .iter()
        .enumerate()
        .filter_map(|(i, row)| feature_from_row(row, i, endpoint, now))
        .take(MAX_FEATURES)
        .collect();

    if features.is_empty() {
        return SyncResult::stale(
            SOURCE_ID,
            "GISTDA endpoint responded, but no point-based disaster records were recognized.",
            endpoint,
        )
        .at(now);
    }

    let warnings = features
        .iter()
        .take(MAX_WARNINGS)
        .map(|f| LocalizedText::both(f.title.clone()))
        .collect();
    let message = format!(
        "Imported {} GISTDA disaster points and refreshed disaster warnings.",
        features.len()
    );
    let collection = MapFeatureCollection {
        layer_id: LAYER_ID.into(),
        updated_at: now,
        bounds: bounds(&features),
        features,
        source: meta(endpoint, now),
    };

    SyncResult::live(SOURCE_ID, message, endpoint)
        .at(now)
        .with_map(vec![collection])
        .with_resilience(ResiliencePatch {
            warnings: Some(warnings),
            ..Default::default()
        })
}

pub struct GistdaDisasterAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl GistdaDisasterAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.gistda_endpoint.trim().to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for GistdaDisasterAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if self.endpoint.is_empty() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Set a confirmed GISTDA endpoint to enable live disaster overlays.",
                SOURCE_URL,
            ));
        }
        match self.fetcher.json::<Value>(&self.endpoint).await {
            Ok(payload) => Ok(build_result(&payload, &self.endpoint, Utc::now())),
            Err(e) => {
                tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "disaster fetch failed");
                Ok(SyncResult::new(
                    SOURCE_ID,
                    e.status(),
                    "Configured GISTDA endpoint failed, leaving disaster layer in fallback mode.",
                    SOURCE_URL,
                ))
            }
        }
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
