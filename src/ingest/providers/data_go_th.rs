//! Open Government Data Thailand: dataset rows normalized into project watches.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::google_news_rss::clean_text;
use super::json_rows::{city_slug, parse_timestamp, pick_number, pick_str, slugify, Row, RowShape};
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{SourceAdapter, SyncResult};
use crate::model::{LocalizedText, ProjectRecord, ProjectStatus, SourceMeta};

const SOURCE_ID: &str = "data-go-th";
const SOURCE_NAME: &str = "Open Government Data Thailand";
const SOURCE_URL: &str = "https://data.go.th";
const MAX_PROJECTS: usize = 8;
const DEFAULT_COMPLETION: f64 = 48.0;

const SHAPE: RowShape = RowShape {
    keys: &["records", "data", "items", "features"],
    nested: &[
        ("result", &["records", "data", "items", "features"]),
        ("response", &["records", "data"]),
    ],
    flatten: &["properties"],
};

const TITLE_KEYS: &[&str] = &[
    "title", "name", "project_name", "project", "projectTitle", "dataset_name", "title_en",
    "title_th", "ชื่อโครงการ", "ชื่อ", "หัวข้อ",
];
const SUMMARY_KEYS: &[&str] = &[
    "summary", "description", "detail", "notes", "remark", "รายละเอียด", "คำอธิบาย",
];
const OWNER_KEYS: &[&str] = &["owner", "agency", "organization", "department", "หน่วยงาน"];
const CITY_KEYS: &[&str] = &["city", "city_name", "province", "จังหวัด", "location"];
const URL_KEYS: &[&str] = &["url", "link", "resource_url", "permalink"];
const UPDATED_KEYS: &[&str] = &[
    "updated_at", "last_updated", "metadata_modified", "published_at", "date", "วันที่",
];
const COMPLETION_KEYS: &[&str] = &[
    "completion_percent", "progress_percent", "progress", "percent", "เปอร์เซ็นต์", "pct",
];
const STATUS_KEYS: &[&str] = &["status", "state", "project_status", "สถานะ"];

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("environment", &["environment", "air", "water", "flood", "waste", "climate", "pm2", "disaster"]),
    ("economy", &["economy", "economic", "finance", "tourism", "investment", "trade"]),
    ("mobility", &["mobility", "traffic", "transport", "transit", "road", "rail"]),
    ("energy", &["energy", "power", "electric", "solar", "grid", "utility"]),
    ("people", &["people", "community", "education", "skills", "talent"]),
    ("living", &["living", "health", "safety", "hospital", "livability", "housing"]),
    ("governance", &["governance", "government", "service", "policy", "administration", "digital"]),
];

fn infer_domain(text: &str) -> &'static str {
    let t = text.to_lowercase();
    DOMAIN_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| t.contains(w)))
        .map_or("governance", |(slug, _)| *slug)
}

fn infer_status(raw: Option<&str>) -> ProjectStatus {
    let value = raw.map(clean_text).unwrap_or_default().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| value.contains(n));
    if has(&["active", "operat", "progress", "ongoing", "ดำเนิน", "เปิดใช้"]) {
        ProjectStatus::Active
    } else if has(&["delay", "risk", "issue", "blocked", "ล่าช้า"]) {
        ProjectStatus::Delayed
    } else if has(&["plan", "pipeline", "propos", "เตรียม", "แผน"]) {
        ProjectStatus::Planned
    } else {
        ProjectStatus::Watch
    }
}

/// One row as a project watch; rows without a title are not projects.
pub fn project_from_row(row: &Row, index: usize, endpoint: &str, now: DateTime<Utc>) -> Option<ProjectRecord> {
    let title = clean_text(pick_str(row, TITLE_KEYS)?);
    if title.is_empty() {
        return None;
    }
    let summary = pick_str(row, SUMMARY_KEYS)
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            "Configured data.go.th dataset record normalized into a live project watch.".into()
        });
    let owner = pick_str(row, OWNER_KEYS)
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| SOURCE_NAME.into());
    let direct_city = pick_str(row, CITY_KEYS);
    let source_url = pick_str(row, URL_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| if endpoint.is_empty() { SOURCE_URL.into() } else { endpoint.into() });
    let updated_at = pick_str(row, UPDATED_KEYS)
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let completion = pick_number(row, COMPLETION_KEYS)
        .unwrap_or(DEFAULT_COMPLETION)
        .round()
        .clamp(0.0, 100.0) as u8;

    let fallback_id = format!("data-go-th-project-{index}");
    let slug = match slugify(&title) {
        s if s.is_empty() => fallback_id.clone(),
        s => s,
    };

    Some(ProjectRecord {
        id: fallback_id,
        slug,
        title: LocalizedText::both(title.clone()),
        city_slug: city_slug(
            &format!("{title} {summary} {}", direct_city.unwrap_or_default()),
            direct_city,
        ),
        domain_slug: infer_domain(&format!("{title} {summary}")).to_string(),
        status: infer_status(pick_str(row, STATUS_KEYS)),
        completion_percent: completion,
        owner: LocalizedText::both(owner),
        summary: LocalizedText::both(summary),
        next_milestone: LocalizedText::new(
            "ตรวจสอบ resource และเชื่อมข้อมูลสดต่อเนื่อง",
            "Validate the dataset resource and keep the live connector in sync.",
        ),
        updated_at,
        source: SourceMeta {
            published_at: Some(updated_at),
            ..SourceMeta::live(SOURCE_NAME, source_url, now, 0.74)
        },
    })
}

/// Normalize a fetched payload. No recognizable rows keeps the source stale.
pub fn build_result(payload: &Value, endpoint: &str, now: DateTime<Utc>) -> SyncResult {
    let url = if endpoint.is_empty() { SOURCE_URL } else { endpoint };
    let projects: Vec<ProjectRecord> = SHAPE
        .extract(payload)
        .iter()
        .enumerate()
        .filter_map(|(i, row)| project_from_row(row, i, endpoint, now))
        .take(MAX_PROJECTS)
        .collect();

    if projects.is_empty() {
        return SyncResult::stale(
            SOURCE_ID,
            "data.go.th endpoint responded, but no recognizable project rows were normalized.",
            url,
        )
        .at(now);
    }

    SyncResult::live(
        SOURCE_ID,
        format!(
            "Imported {} data.go.th project rows from the configured endpoint.",
            projects.len()
        ),
        url,
    )
    .at(now)
    .with_projects(projects)
}

pub struct DataGoThAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl DataGoThAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.data_go_th_endpoint.trim().to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for DataGoThAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if self.endpoint.is_empty() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Configure a dataset-specific data.go.th endpoint to enable live pulls.",
                SOURCE_URL,
            ));
        }
        match self.fetcher.json::<Value>(&self.endpoint).await {
            Ok(payload) => Ok(build_result(&payload, &self.endpoint, Utc::now())),
            Err(e) => {
                tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "dataset fetch failed");
                Ok(SyncResult::new(
                    SOURCE_ID,
                    e.status(),
                    "Configured data.go.th endpoint failed, using dataset-registry fallback.",
                    SOURCE_URL,
                ))
            }
        }
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
