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

const SOURCE_ID: &str = "open-meteo-weather";
const SOURCE_NAME: &str = "Open-Meteo Forecast";
const SOURCE_URL: &str = "https://open-meteo.com/en/docs";
const LAYER_ID: &str = "weather";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    current: Option<WeatherCurrent>,
}

#[derive(Debug, Deserialize)]
struct WeatherCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub temperature: i64,
    pub humidity: i64,
    pub wind: i64,
}

impl WeatherReading {
    pub fn from_json(value: serde_json::Value) -> Result<Self, PayloadError> {
        let payload: WeatherPayload =
            serde_json::from_value(value).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        let current = payload.current.ok_or(PayloadError::MissingField("current"))?;
        let temperature = current
            .temperature_2m
            .ok_or(PayloadError::MissingField("temperature_2m"))?;
        if !(-60.0..=70.0).contains(&temperature) {
            return Err(PayloadError::OutOfRange {
                field: "temperature_2m",
                value: temperature,
            });
        }
        let humidity = current.relative_humidity_2m.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&humidity) {
            return Err(PayloadError::OutOfRange {
                field: "relative_humidity_2m",
                value: humidity,
            });
        }
        Ok(Self {
            temperature: round_half_up(temperature),
            humidity: round_half_up(humidity),
            wind: round_half_up(current.wind_speed_10m.unwrap_or(0.0).max(0.0)),
        })
    }
}

fn meta(now: DateTime<Utc>) -> SourceMeta {
    SourceMeta::live(SOURCE_NAME, SOURCE_URL, now, 0.88)
}

/// Weather layer plus the resilience weather summary (hottest city).
pub fn build_result(readings: &[(MonitoringCity, WeatherReading)], now: DateTime<Utc>) -> SyncResult {
    let mut hottest: Option<&(MonitoringCity, WeatherReading)> = None;
    for r in readings {
        if hottest.is_none_or(|h| r.1.temperature > h.1.temperature) {
            hottest = Some(r);
        }
    }
    let Some((city, w)) = hottest.copied() else {
        return SyncResult::stale(
            SOURCE_ID,
            "Weather endpoint unavailable. Retaining cached national weather layer.",
            SOURCE_URL,
        )
        .at(now);
    };

    let features = readings
        .iter()
        .map(|(c, r)| {
            let properties: BTreeMap<String, PropertyValue> = [
                ("city", PropertyValue::from(c.label_en)),
                ("region", PropertyValue::from(c.region_en)),
                ("temperatureC", PropertyValue::from(r.temperature)),
                ("humidity", PropertyValue::from(r.humidity)),
                ("windKmH", PropertyValue::from(r.wind)),
                ("population", PropertyValue::from(c.population as i64)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

            GeoFeatureRecord {
                id: format!("{LAYER_ID}-{}", c.slug),
                layer_id: LAYER_ID.into(),
                geometry_type: GeometryType::Point,
                coordinates: json!([c.lon, c.lat]),
                title: c.label_en.into(),
                description: Some(format!("{} live weather watchpoint", c.label_en)),
                properties,
                source: meta(now),
            }
        })
        .collect();

    SyncResult::live(
        SOURCE_ID,
        format!("Weather feed refreshed for {} Thai cities.", readings.len()),
        SOURCE_URL,
    )
    .at(now)
    .with_map(vec![MapFeatureCollection {
        layer_id: LAYER_ID.into(),
        updated_at: now,
        features,
        bounds: bounds_of(readings.iter().map(|(c, _)| c)),
        source: meta(now),
    }])
    .with_resilience(ResiliencePatch {
        weather_temperature_c: Some(w.temperature as f64),
        weather_summary: Some(LocalizedText::new(
            format!(
                "{} {}°C | ความชื้น {}% | ลม {} กม./ชม.",
                city.label_th, w.temperature, w.humidity, w.wind
            ),
            format!(
                "{} {}C | humidity {}% | wind {} km/h.",
                city.label_en, w.temperature, w.humidity, w.wind
            ),
        )),
        ..Default::default()
    })
}

pub struct OpenMeteoWeatherAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl OpenMeteoWeatherAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.open_meteo_weather_endpoint.clone(),
        }
    }

    async fn read_city(&self, city: &MonitoringCity) -> Result<WeatherReading, PayloadError> {
        let url = city_query_url(&self.endpoint, city, CURRENT_FIELDS)
            .ok_or(PayloadError::NotConfigured)?;
        WeatherReading::from_json(self.fetcher.json(&url).await?)
    }
}

#[async_trait]
impl SourceAdapter for OpenMeteoWeatherAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        let settled = join_all(
            MONITORING_CITIES
                .iter()
                .map(|c| async move { (*c, self.read_city(c).await) }),
        )
        .await;

        let readings: Vec<_> = settled
            .into_iter()
            .filter_map(|(city, r)| r.ok().map(|w| (city, w)))
            .collect();

        Ok(build_result(&readings, Utc::now()))
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FreshnessStatus;

    #[test]
    fn rejects_impossible_humidity() {
        let err = WeatherReading::from_json(json!({
            "current": {"temperature_2m": 31.2, "relative_humidity_2m": 140}
        }))
        .unwrap_err();
        assert!(matches!(err, PayloadError::OutOfRange { field: "relative_humidity_2m", .. }));
    }

    #[test]
    fn hottest_city_summarized() {
        let readings = vec![
            (MONITORING_CITIES[0], WeatherReading { temperature: 33, humidity: 60, wind: 12 }),
            (MONITORING_CITIES[5], WeatherReading { temperature: 35, humidity: 70, wind: 8 }),
        ];
        let r = build_result(&readings, Utc::now());
        assert_eq!(r.status, FreshnessStatus::Live);
        let patch = r.resilience_patch.unwrap();
        assert_eq!(patch.weather_temperature_c, Some(35.0));
        assert_eq!(
            patch.weather_summary.map(|s| s.en),
            Some("Hat Yai 35C | humidity 70% | wind 8 km/h.".to_string())
        );
        assert_eq!(r.map_feature_collections[0].layer_id, "weather");
    }

    #[tokio::test]
    async fn offline_is_stale() {
        let a = OpenMeteoWeatherAdapter::new(&SyncConfig::default(), Fetcher::new(false));
        let r = a.sync().await.unwrap();
        assert_eq!(r.status, FreshnessStatus::Stale);
    }
}
