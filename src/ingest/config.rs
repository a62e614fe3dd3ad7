// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "SYNC_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/sync.toml";
const CITYDATA_SEARCH: &str = "https://catalog.citydata.in.th/api/3/action/package_search?q=%22smart%20city%22&rows=12&sort=metadata_modified%20desc";

/// Runtime configuration for the sync loop, adapters and serving surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub port: u16,
    pub admin_token: String,
    pub allow_live_fetch: bool,
    pub sync_interval_ms: u64,
    pub google_news_rss_queries: Vec<String>,
    pub google_alerts_feeds: Vec<String>,
    pub citydata_endpoint: String,
    pub urbanis_endpoint: String,
    pub data_go_th_endpoint: String,
    pub gistda_endpoint: String,
    pub gdelt_doc_endpoint: String,
    pub youtube_channel_ids: Vec<String>,
    pub open_meteo_weather_endpoint: String,
    pub open_meteo_air_endpoint: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            admin_token: "change-me".into(),
            allow_live_fetch: false,
            sync_interval_ms: 300_000,
            google_news_rss_queries: Vec::new(),
            google_alerts_feeds: Vec::new(),
            citydata_endpoint: CITYDATA_SEARCH.into(),
            urbanis_endpoint: String::new(),
            data_go_th_endpoint: String::new(),
            gistda_endpoint: String::new(),
            gdelt_doc_endpoint: String::new(),
            youtube_channel_ids: Vec::new(),
            open_meteo_weather_endpoint: "https://api.open-meteo.com/v1/forecast".into(),
            open_meteo_air_endpoint: "https://air-quality-api.open-meteo.com/v1/air-quality"
                .into(),
        }
    }
}

impl SyncConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: SyncConfig = toml::from_str(s).context("parsing sync config toml")?;
        cfg.google_news_rss_queries = clean_list(cfg.google_news_rss_queries);
        cfg.google_alerts_feeds = clean_list(cfg.google_alerts_feeds);
        cfg.youtube_channel_ids = clean_list(cfg.youtube_channel_ids);
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sync config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $SYNC_CONFIG_PATH (must exist)
    /// 2) config/sync.toml
    /// 3) defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("SYNC_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_PATH);
            if pb.exists() {
                Self::load_from(&pb)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    /// Environment wins over file values.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_str("PORT") {
            self.port = v.parse().with_context(|| format!("PORT={v}"))?;
        }
        if let Some(v) = env_str("ADMIN_TOKEN") {
            self.admin_token = v;
        }
        if let Some(v) = env_str("ALLOW_LIVE_FETCH") {
            self.allow_live_fetch = matches!(v.to_ascii_lowercase().as_str(), "true" | "1");
        }
        if let Some(v) = env_str("SYNC_INTERVAL_MS") {
            self.sync_interval_ms = v
                .parse()
                .with_context(|| format!("SYNC_INTERVAL_MS={v}"))?;
        }
        if let Some(v) = env_str("GOOGLE_NEWS_RSS_QUERIES") {
            self.google_news_rss_queries = split_pipe(&v);
        }
        if let Some(v) = env_str("GOOGLE_ALERTS_FEEDS") {
            self.google_alerts_feeds = split_pipe(&v);
        }
        if let Some(v) = env_str("CITYDATA_CATALOG_ENDPOINT") {
            self.citydata_endpoint = v;
        }
        if let Some(v) = env_str("URBANIS_ENDPOINT") {
            self.urbanis_endpoint = v;
        }
        if let Some(v) = env_str("DATAGOTH_ENDPOINT") {
            self.data_go_th_endpoint = v;
        }
        if let Some(v) = env_str("GISTDA_ENDPOINT") {
            self.gistda_endpoint = v;
        }
        if let Some(v) = env_str("GDELT_DOC_ENDPOINT") {
            self.gdelt_doc_endpoint = v;
        }
        if let Some(v) = env_str("YOUTUBE_CHANNEL_IDS") {
            self.youtube_channel_ids = split_pipe(&v);
        }
        if let Some(v) = env_str("OPEN_METEO_WEATHER_ENDPOINT") {
            self.open_meteo_weather_endpoint = v;
        }
        if let Some(v) = env_str("OPEN_METEO_AIR_ENDPOINT") {
            self.open_meteo_air_endpoint = v;
        }
        Ok(self)
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string())
}

fn split_pipe(s: &str) -> Vec<String> {
    clean_list(s.split('|').map(str::to_string).collect())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty())
        .collect()
}
