//! Concrete source adapters.

pub mod citydata;
pub mod data_go_th;
pub mod gdelt;
pub mod gistda_disaster;
pub mod google_news_rss;
pub mod json_rows;
pub mod open_meteo_air;
pub mod open_meteo_weather;
pub mod time_sync;
pub mod urbanis;
pub mod youtube_signals;

/// A city sampled by the per-city environmental adapters.
#[derive(Debug, Clone, Copy)]
pub struct MonitoringCity {
    pub slug: &'static str,
    pub label_th: &'static str,
    pub label_en: &'static str,
    pub region_en: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub population: u64,
}

pub const MONITORING_CITIES: &[MonitoringCity] = &[
    MonitoringCity {
        slug: "bangkok",
        label_th: "กรุงเทพมหานคร",
        label_en: "Bangkok",
        region_en: "Central",
        lat: 13.7563,
        lon: 100.5018,
        population: 10_539_000,
    },
    MonitoringCity {
        slug: "chiang-mai",
        label_th: "เชียงใหม่",
        label_en: "Chiang Mai",
        region_en: "North",
        lat: 18.7883,
        lon: 98.9853,
        population: 1_270_000,
    },
    MonitoringCity {
        slug: "khon-kaen",
        label_th: "ขอนแก่น",
        label_en: "Khon Kaen",
        region_en: "Northeast",
        lat: 16.4322,
        lon: 102.8236,
        population: 412_000,
    },
    MonitoringCity {
        slug: "phuket",
        label_th: "ภูเก็ต",
        label_en: "Phuket",
        region_en: "South",
        lat: 7.8804,
        lon: 98.3923,
        population: 417_000,
    },
    MonitoringCity {
        slug: "chon-buri",
        label_th: "ชลบุรี",
        label_en: "Chon Buri",
        region_en: "East",
        lat: 13.3611,
        lon: 100.9847,
        population: 1_550_000,
    },
    MonitoringCity {
        slug: "hat-yai",
        label_th: "หาดใหญ่",
        label_en: "Hat Yai",
        region_en: "South",
        lat: 7.0084,
        lon: 100.4747,
        population: 415_000,
    },
];

/// `[min_lat, min_lon, max_lat, max_lon]` over the given cities.
pub fn bounds_of<'a, I>(cities: I) -> Option<[f64; 4]>
where
    I: IntoIterator<Item = &'a MonitoringCity>,
{
    cities.into_iter().fold(None, |acc, c| {
        Some(match acc {
            None => [c.lat, c.lon, c.lat, c.lon],
            Some([a, b, x, y]) => [a.min(c.lat), b.min(c.lon), x.max(c.lat), y.max(c.lon)],
        })
    })
}

/// Open-Meteo style per-city query URL.
pub fn city_query_url(base: &str, city: &MonitoringCity, current: &str) -> Option<String> {
    reqwest::Url::parse_with_params(
        base,
        &[
            ("latitude", city.lat.to_string()),
            ("longitude", city.lon.to_string()),
            ("current", current.to_string()),
            ("timezone", "Asia/Bangkok".to_string()),
        ],
    )
    .ok()
    .map(String::from)
}
