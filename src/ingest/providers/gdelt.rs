//! GDELT DOC API: global article list as external news plus an observed
//! social-listening signal scored from headline tone.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

use super::google_news_rss::{clean_text, infer_city};
use super::json_rows::{parse_timestamp, slugify};
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{SocialSignal, SourceAdapter, SyncResult};
use crate::model::{LocalizedText, NewsItem, NewsKind, SourceMeta};
use crate::store::derived::{round_half_up, top_terms};

const SOURCE_ID: &str = "gdelt-signals";
const SOURCE_NAME: &str = "GDELT Signals";
const SOURCE_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc";
const MAX_ARTICLES: usize = 6;
const TONE_STEP: i64 = 18;

const POSITIVE: &[&str] = &["improve", "launch", "expand", "advance", "boost", "growth", "progress"];
const NEGATIVE: &[&str] = &["risk", "delay", "crisis", "flood", "smog", "warning", "decline"];

const STOP_WORDS: &[&str] = &[
    "smart", "city", "thailand", "about", "after", "before", "their", "where", "which", "from",
    "into", "with", "this", "that", "will", "your", "have", "been", "more", "than", "news",
];

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("environment", &["environment", "climate", "air", "flood", "water", "disaster"]),
    ("mobility", &["mobility", "traffic", "transit", "transport", "road"]),
    ("economy", &["economy", "investment", "industry", "tourism", "trade"]),
    ("energy", &["energy", "power", "grid", "solar"]),
    ("people", &["people", "education", "skills", "community"]),
    ("living", &["living", "health", "safety", "livability"]),
    ("governance", &["governance", "policy", "data", "government", "digital"]),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DocResponse {
    articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Article {
    pub title: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub seendate: Option<String>,
}

fn infer_domain(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    DOMAIN_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| t.contains(w)))
        .map(|(slug, _)| *slug)
}

/// +1 per positive cue, -1 per negative cue, scaled and clamped to ±100.
pub fn tone_score(text: &str) -> i64 {
    let t = text.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| t.contains(*w)).count() as i64;
    ((hits(POSITIVE) - hits(NEGATIVE)) * TONE_STEP).clamp(-100, 100)
}

/// GDELT `seendate` is compact (`20260228T103000Z`); ISO forms are accepted too.
fn parse_seen(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y%m%dT%H%M%SZ")
        .map(|dt| dt.and_utc())
        .ok()
        .or_else(|| parse_timestamp(raw))
}

fn headline_terms(titles: &[String]) -> Vec<String> {
    let words: Vec<String> = titles
        .iter()
        .flat_map(|t| {
            t.to_lowercase()
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|w| w.len() >= 4 && !STOP_WORDS.contains(w))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    top_terms(words.iter().map(String::as_str))
}

/// News items and the tone-derived signal. No usable article keeps it stale.
pub fn build_result(articles: Vec<Article>, endpoint: &str, now: DateTime<Utc>) -> SyncResult {
    let articles: Vec<Article> = articles
        .into_iter()
        .filter(|a| {
            a.title.as_deref().is_some_and(|t| !t.is_empty())
                && a.url.as_deref().is_some_and(|u| !u.is_empty())
        })
        .take(MAX_ARTICLES)
        .collect();

    if articles.is_empty() {
        return SyncResult::stale(
            SOURCE_ID,
            "GDELT responded but returned no matching article list items.",
            endpoint,
        )
        .at(now);
    }

    let titles: Vec<String> = articles
        .iter()
        .map(|a| clean_text(a.title.as_deref().unwrap_or_default()))
        .collect();

    let news: Vec<NewsItem> = articles
        .iter()
        .zip(&titles)
        .enumerate()
        .map(|(i, (a, title))| {
            let title = if title.is_empty() {
                format!("GDELT signal {}", i + 1)
            } else {
                title.clone()
            };
            let excerpt = match a.domain.as_deref().filter(|d| !d.is_empty()) {
                Some(d) => format!("Global media signal captured from {d}."),
                None => "Global media signal captured from GDELT.".to_string(),
            };
            let text = format!("{title} {excerpt}");
            let published = a.seendate.as_deref().and_then(parse_seen).unwrap_or(now);
            let id = format!("gdelt-news-{i}");
            let slug = match slugify(&title) {
                s if s.is_empty() => id.clone(),
                s => s,
            };
            NewsItem {
                id,
                slug,
                title: LocalizedText::both(title),
                excerpt: LocalizedText::both(excerpt),
                kind: NewsKind::External,
                city_slug: infer_city(&text).map(str::to_string),
                domain_slug: infer_domain(&text).map(str::to_string),
                published_at: published,
                source: SourceMeta {
                    published_at: Some(published),
                    ..SourceMeta::live(SOURCE_NAME, a.url.clone().unwrap_or_default(), now, 0.74)
                },
            }
        })
        .collect();

    let scores: Vec<i64> = articles
        .iter()
        .map(|a| {
            tone_score(&format!(
                "{} {}",
                a.title.as_deref().unwrap_or_default(),
                a.domain.as_deref().unwrap_or_default()
            ))
        })
        .collect();
    let n = scores.len() as f64;
    let sentiment = round_half_up(scores.iter().sum::<i64>() as f64 / n);
    let positive_share = scores.iter().filter(|s| **s >= 0).count() as f64 / n;
    let domains: HashSet<String> = articles
        .iter()
        .filter_map(|a| a.domain.as_deref().map(clean_text))
        .filter(|d| !d.is_empty())
        .collect();
    let source_count = domains.len().max(1) as u64;

    let message = format!(
        "Imported {} GDELT media signals across {source_count} source domains.",
        news.len()
    );
    let signal = SocialSignal {
        mention_count: news.len() as u64,
        sentiment_score: sentiment as f64,
        source_count,
        positive_share,
        dominant_source: SOURCE_NAME.into(),
        top_terms: headline_terms(&titles),
        source_name: SOURCE_NAME.into(),
    };

    SyncResult::live(SOURCE_ID, message, endpoint)
        .at(now)
        .with_news(news)
        .with_social_signal(signal)
}

pub struct GdeltAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl GdeltAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: cfg.gdelt_doc_endpoint.trim().to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for GdeltAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if self.endpoint.is_empty() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Set a GDELT endpoint to enable live global media monitoring.",
                SOURCE_URL,
            ));
        }
        match self.fetcher.json::<DocResponse>(&self.endpoint).await {
            Ok(doc) => Ok(build_result(doc.articles, &self.endpoint, Utc::now())),
            Err(e) => {
                tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "article list fetch failed");
                Ok(SyncResult::new(
                    SOURCE_ID,
                    e.status(),
                    "GDELT signals are unavailable right now. Keeping the cached external narrative.",
                    SOURCE_URL,
                ))
            }
        }
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
