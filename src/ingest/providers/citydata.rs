//! CityData Thailand CKAN catalog: smart-city packages as external news,
//! city-linked packages as project watches, plus the national coverage layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::google_news_rss::clean_text;
use super::json_rows::{mentioned_city, parse_timestamp, slugify};
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{SourceAdapter, SyncResult};
use crate::model::{
    LocalizedText, MapFeatureCollection, NewsItem, NewsKind, ProjectRecord, ProjectStatus,
    SourceMeta,
};
use crate::seed::{self, COVERAGE_LAYER_ID};

const SOURCE_ID: &str = "citydata";
const SOURCE_NAME: &str = "CityData Thailand";
const SOURCE_URL: &str = "https://catalog.citydata.in.th/api/3/action/package_search";
const PACKAGE_URL: &str = "https://catalog.citydata.in.th/en";
const MAX_NEWS: usize = 6;

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("environment", &["environment", "air", "water", "flood", "pm2", "waste", "climate"]),
    ("economy", &["economy", "economic", "tourism", "investment", "business"]),
    ("mobility", &["mobility", "transport", "traffic", "transit", "road", "travel"]),
    ("energy", &["energy", "power", "electric", "solar", "grid"]),
    ("people", &["people", "education", "skill", "community", "participation"]),
    ("living", &["living", "health", "safety", "livability", "service"]),
    ("governance", &["governance", "government", "open data", "policy", "administration"]),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageSearch {
    success: bool,
    result: Option<PackageResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageResults {
    results: Vec<CkanPackage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CkanPackage {
    pub id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub metadata_modified: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<CkanTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CkanTag {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

impl CkanPackage {
    fn title_or(&self, fallback: String) -> String {
        let t = clean_text(self.title.as_deref().or(self.name.as_deref()).unwrap_or_default());
        if t.is_empty() { fallback } else { t }
    }

    fn notes_or(&self, fallback: &str) -> String {
        let n = clean_text(self.notes.as_deref().unwrap_or_default());
        if n.is_empty() { fallback.to_string() } else { n }
    }

    fn tag_text(&self) -> String {
        self.tags
            .iter()
            .map(|t| {
                format!(
                    "{} {}",
                    t.name.as_deref().unwrap_or_default(),
                    t.display_name.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_smart_city(&self) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.title_or(String::new()),
            self.notes_or(""),
            self.tag_text()
        )
        .to_lowercase();
        ["smart city", "smartcity", "city data"]
            .iter()
            .any(|n| haystack.contains(n))
    }

    fn domain(&self, text: &str) -> &'static str {
        let haystack = format!("{text} {}", self.tag_text()).to_lowercase();
        DOMAIN_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
            .map_or("environment", |(slug, _)| *slug)
    }

    /// `name`, else `title`, else the position in the result list.
    fn handle(&self, index: usize) -> String {
        self.name
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| index.to_string())
    }

    fn key(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| index.to_string())
    }

    fn modified(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.metadata_modified
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now)
    }

    fn meta(&self, published: DateTime<Utc>, now: DateTime<Utc>) -> SourceMeta {
        let url = self.url.as_deref().filter(|u| !u.is_empty()).unwrap_or(PACKAGE_URL);
        SourceMeta {
            published_at: Some(published),
            ..SourceMeta::live(SOURCE_NAME, url, now, 0.76)
        }
    }
}

fn news_from_package(pkg: &CkanPackage, index: usize, now: DateTime<Utc>) -> NewsItem {
    let title = pkg.title_or(format!("CityData smart city signal {}", index + 1));
    let excerpt = pkg.notes_or(
        "Catalog-backed Smart City Thailand dataset discovered from the CityData CKAN API.",
    );
    let text = format!("{title} {excerpt}");
    let published = pkg.modified(now);
    NewsItem {
        id: format!("citydata-news-{}", pkg.key(index)),
        slug: slugify(&format!("citydata-{}", pkg.handle(index))),
        title: LocalizedText::both(title.clone()),
        excerpt: LocalizedText::both(excerpt.clone()),
        kind: NewsKind::External,
        city_slug: mentioned_city(&text).map(str::to_string),
        domain_slug: Some(pkg.domain(&text).to_string()),
        published_at: published,
        source: pkg.meta(published, now),
    }
}

/// Only packages naming a monitored city become project watches.
fn project_from_package(pkg: &CkanPackage, index: usize, now: DateTime<Utc>) -> Option<ProjectRecord> {
    let title = pkg.title_or(format!("CityData tracked project {}", index + 1));
    let summary = pkg.notes_or("CityData smart-city catalog record under active monitoring.");
    let text = format!("{title} {summary}");
    let city = mentioned_city(&text)?;
    let updated = pkg.modified(now);
    Some(ProjectRecord {
        id: format!("citydata-project-{}", pkg.key(index)),
        slug: slugify(&format!("citydata-project-{}", pkg.handle(index))),
        title: LocalizedText::both(title.clone()),
        city_slug: city.to_string(),
        domain_slug: pkg.domain(&text).to_string(),
        status: ProjectStatus::Watch,
        completion_percent: 50,
        owner: LocalizedText::both(SOURCE_NAME),
        summary: LocalizedText::both(summary.clone()),
        next_milestone: LocalizedText::new(
            "ยืนยัน resource endpoint และรายละเอียดการใช้งานต่อ",
            "Validate resource endpoints and expand the live connector.",
        ),
        updated_at: updated,
        source: pkg.meta(updated, now),
    })
}

fn coverage_layer() -> Option<MapFeatureCollection> {
    seed::map_feature_collections()
        .into_iter()
        .find(|c| c.layer_id == COVERAGE_LAYER_ID)
}

/// Normalize a package search. Smart-city packages are preferred; when none
/// match, every package is a candidate.
pub fn build_result(packages: Vec<CkanPackage>, now: DateTime<Utc>) -> SyncResult {
    let smart: Vec<&CkanPackage> = packages.iter().filter(|p| p.is_smart_city()).collect();
    let candidates: Vec<&CkanPackage> = if smart.is_empty() {
        packages.iter().collect()
    } else {
        smart
    };

    if candidates.is_empty() {
        return SyncResult::stale(
            SOURCE_ID,
            "CityData CKAN responded without any catalog packages.",
            SOURCE_URL,
        )
        .at(now);
    }

    let news: Vec<NewsItem> = candidates
        .iter()
        .take(MAX_NEWS)
        .enumerate()
        .map(|(i, p)| news_from_package(p, i, now))
        .collect();
    let projects: Vec<ProjectRecord> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, p)| project_from_package(p, i, now))
        .collect();

    let message = format!(
        "Imported {} CKAN package signals, {} city-linked project watches, and refreshed the nationwide Smart City Thailand footprint layer.",
        candidates.len(),
        projects.len()
    );
    SyncResult::live(SOURCE_ID, message, SOURCE_URL)
        .at(now)
        .with_news(news)
        .with_projects(projects)
        .with_map(coverage_layer().into_iter().collect())
}

pub struct CitydataAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl CitydataAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.citydata_endpoint.trim().to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for CitydataAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if self.endpoint.is_empty() || !self.fetcher.allow_live() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "CityData adapter is configured for metadata mode until a stable endpoint is provided.",
                SOURCE_URL,
            ));
        }
        match self.fetcher.json::<PackageSearch>(&self.endpoint).await {
            Ok(search) => {
                let packages = match search {
                    PackageSearch {
                        success: true,
                        result: Some(r),
                    } => r.results,
                    _ => Vec::new(),
                };
                Ok(build_result(packages, Utc::now()))
            }
            Err(e) => {
                tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "catalog fetch failed");
                Ok(SyncResult::new(
                    SOURCE_ID,
                    e.status(),
                    "CityData CKAN endpoint unavailable, serving catalog metadata fallback.",
                    SOURCE_URL,
                ))
            }
        }
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
