use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::{bounds_of, city_query_url, MonitoringCity, MONITORING_CITIES};
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{PayloadError, ResiliencePatch, SourceAdapter, SyncResult};
use crate::model::{
    GeoFeatureRecord, GeometryType, LocalizedText, MapFeatureCollection, PropertyValue, SourceMeta,
};
use crate::store::derived::round_half_up;

const SOURCE_ID: &str = "open-meteo-air";
const SOURCE_NAME: &str = "Open-Meteo Air Quality";
const SOURCE_URL: &str = "https://open-meteo.com/en/docs/air-quality-api";
const LAYER_ID: &str = "pollution";
const CURRENT_FIELDS: &str = "pm10,pm2_5,us_aqi";

#[derive(Debug, Deserialize)]
struct AirPayload {
    current: Option<AirCurrent>,
}

#[derive(Debug, Deserialize)]
struct AirCurrent {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    us_aqi: Option<f64>,
}

/// Validated reading for one city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirReading {
    pub aqi: u32,
    pub pm25: i64,
    pub pm10: i64,
}

fn non_negative(field: &'static str, v: f64) -> Result<f64, PayloadError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(PayloadError::OutOfRange { field, value: v })
    }
}

impl AirReading {
    pub fn from_json(value: serde_json::Value) -> Result<Self, PayloadError> {
        let payload: AirPayload =
            serde_json::from_value(value).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        let current = payload.current.ok_or(PayloadError::MissingField("current"))?;
        let aqi = non_negative("us_aqi", current.us_aqi.ok_or(PayloadError::MissingField("us_aqi"))?)?;
        let pm25 = non_negative("pm2_5", current.pm2_5.unwrap_or(0.0))?;
        let pm10 = non_negative("pm10", current.pm10.unwrap_or(0.0))?;
        Ok(Self {
            aqi: round_half_up(aqi) as u32,
            pm25: round_half_up(pm25),
            pm10: round_half_up(pm10),
        })
    }
}

fn meta(now: DateTime<Utc>) -> SourceMeta {
    SourceMeta::live(SOURCE_NAME, SOURCE_URL, now, 0.86)
}

/// Build the pollution layer plus the resilience patch (highest-AQI city).
pub fn build_result(readings: &[(MonitoringCity, AirReading)], now: DateTime<Utc>) -> SyncResult {
    let Some((worst_city, worst)) = readings
        .iter()
        .fold(None::<&(MonitoringCity, AirReading)>, |best, r| match best {
            Some(b) if b.1.aqi >= r.1.aqi => Some(b),
            _ => Some(r),
        })
        .copied()
    else {
        return SyncResult::stale(
            SOURCE_ID,
            "Air-quality endpoint unavailable. Retaining cached AQI layer.",
            SOURCE_URL,
        )
        .at(now);
    };

    let features = readings
        .iter()
        .map(|(city, r)| {
            let mut properties = BTreeMap::new();
            properties.insert("city".into(), PropertyValue::from(city.label_en));
            properties.insert("region".into(), PropertyValue::from(city.region_en));
            properties.insert("aqi".into(), PropertyValue::from(r.aqi as i64));
            properties.insert("pm25".into(), PropertyValue::from(r.pm25));
            properties.insert("pm10".into(), PropertyValue::from(r.pm10));
            properties.insert("population".into(), PropertyValue::from(city.population as i64));
            GeoFeatureRecord {
                id: format!("{LAYER_ID}-{}", city.slug),
                layer_id: LAYER_ID.into(),
                geometry_type: GeometryType::Point,
                coordinates: json!([city.lon, city.lat]),
                title: city.label_en.into(),
                description: Some(format!("{} AQI watchpoint", city.label_en)),
                properties,
                source: meta(now),
            }
        })
        .collect();

    let collection = MapFeatureCollection {
        layer_id: LAYER_ID.into(),
        updated_at: now,
        features,
        bounds: bounds_of(readings.iter().map(|(c, _)| c)),
        source: meta(now),
    };

    let summary = |label: &str| {
        format!(
            "{label} AQI {} | PM2.5 {} | PM10 {}",
            worst.aqi, worst.pm25, worst.pm10
        )
    };

    SyncResult::live(
        SOURCE_ID,
        format!("Air-quality feed refreshed for {} Thai cities.", readings.len()),
        SOURCE_URL,
    )
    .at(now)
    .with_map(vec![collection])
    .with_resilience(ResiliencePatch {
        aqi: Some(worst.aqi),
        pollution_summary: Some(LocalizedText::new(
            summary(worst_city.label_th),
            summary(worst_city.label_en),
        )),
        ..Default::default()
    })
}

pub struct OpenMeteoAirAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl OpenMeteoAirAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.open_meteo_air_endpoint.clone(),
        }
    }

    async fn read_city(&self, city: &MonitoringCity) -> Result<AirReading, PayloadError> {
        let url = city_query_url(&self.endpoint, city, CURRENT_FIELDS)
            .ok_or(PayloadError::NotConfigured)?;
        AirReading::from_json(self.fetcher.json(&url).await?)
    }
}

#[async_trait]
impl SourceAdapter for OpenMeteoAirAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        let settled = join_all(MONITORING_CITIES.iter().map(|c| async move {
            (*c, self.read_city(c).await)
        }))
        .await;

        let readings: Vec<(MonitoringCity, AirReading)> = settled
            .into_iter()
            .filter_map(|(city, r)| match r {
                Ok(reading) => Some((city, reading)),
                Err(e) => {
                    tracing::debug!(target: "sync", source_id = SOURCE_ID, city = city.slug, error = %e, "city skipped");
                    None
                }
            })
            .collect();

        Ok(build_result(&readings, Utc::now()))
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
