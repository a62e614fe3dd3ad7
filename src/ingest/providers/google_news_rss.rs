use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{PayloadError, SourceAdapter, SyncResult};
use crate::model::{FallbackMode, FreshnessStatus, LocalizedText, NewsItem, NewsKind, SourceMeta};

const SOURCE_ID: &str = "google-news-rss";
const SOURCE_URL: &str = "https://news.google.com";
const SEARCH_URL: &str = "https://news.google.com/rss/search";
const MAX_ITEMS: usize = 10;

const DEFAULT_QUERIES: &[&str] = &[
    "\"smart city\" Thailand",
    "\"smart mobility\" Thailand",
    "\"smart environment\" Thailand",
    "\"smart living\" Thailand",
    "\"Smart City Thailand Office\" OR \"Digital Economy Promotion Agency\"",
];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

/// Decode entities, strip tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]+>").expect("tag regex"));
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));

    let decoded = html_escape::decode_html_entities(s);
    let stripped = re_tags.replace_all(&decoded, " ");
    // Descriptions are often double-escaped (`&amp;nbsp;`).
    let decoded = html_escape::decode_html_entities(&stripped);
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

pub fn infer_city(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    [
        ("bangkok", "bangkok"),
        ("phuket", "phuket"),
        ("chiang mai", "chiang-mai"),
        ("khon kaen", "khon-kaen"),
    ]
    .into_iter()
    .find(|(needle, _)| t.contains(needle))
    .map(|(_, slug)| slug)
}

pub fn infer_domain(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    let table: &[(&str, &[&str])] = &[
        ("environment", &["environment", "climate", "air", "flood"]),
        ("mobility", &["mobility", "transit", "transport"]),
        ("economy", &["economy", "investment", "industry"]),
        ("energy", &["energy", "power"]),
        ("people", &["people", "skills", "education"]),
        ("living", &["living", "health", "safety"]),
        ("governance", &["governance", "data", "policy"]),
    ];
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| t.contains(w)))
        .map(|(slug, _)| *slug)
}

pub fn parse_feed(xml: &str) -> Result<Vec<RssItem>, PayloadError> {
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(xml).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    histogram!("sync_rss_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(rss.channel.item)
}

fn fingerprint(link: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Map feed items to external news. Items with neither title nor description are dropped.
pub fn normalize(items: Vec<RssItem>, source_name: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let prefix = format!(
        "external-google-{}",
        source_name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
    );

    items
        .into_iter()
        .filter(|it| it.title.is_some() || it.description.is_some())
        .map(|it| {
            let title = clean_text(it.title.as_deref().unwrap_or_default());
            let excerpt = clean_text(it.description.as_deref().unwrap_or_default());
            let combined = format!("{title} {excerpt}");
            let link = it.link.unwrap_or_else(|| SOURCE_URL.to_string());
            let published = it.pub_date.as_deref().and_then(parse_rfc2822);
            let id = format!("{prefix}-{}", fingerprint(&link, &title));

            NewsItem {
                slug: id.clone(),
                id,
                title: if title.is_empty() {
                    LocalizedText::new("อัปเดตข่าวเมืองอัจฉริยะ", "Smart city news update")
                } else {
                    LocalizedText::both(title.clone())
                },
                excerpt: if excerpt.is_empty() {
                    LocalizedText::new(
                        "สัญญาณข่าวภายนอกจาก Google feed",
                        "External news signal from a Google feed.",
                    )
                } else {
                    LocalizedText::both(excerpt)
                },
                kind: NewsKind::External,
                city_slug: infer_city(&combined).map(str::to_string),
                domain_slug: infer_domain(&combined).map(str::to_string),
                published_at: published.unwrap_or(now),
                source: SourceMeta {
                    source_name: source_name.to_string(),
                    source_url: Some(link),
                    fetched_at: now,
                    published_at: published,
                    freshness_status: FreshnessStatus::Live,
                    confidence: 0.76,
                    fallback_mode: FallbackMode::Live,
                },
            }
        })
        .collect()
}

/// Keep the first item per (link, title), capped.
pub fn dedup_and_cap(items: Vec<NewsItem>, cap: usize) -> Vec<NewsItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    items
        .into_iter()
        .filter(|n| {
            seen.insert((
                n.source.source_url.clone().unwrap_or_default(),
                n.title.en.clone(),
            ))
        })
        .take(cap)
        .collect()
}

pub struct GoogleNewsRssAdapter {
    fetcher: Fetcher,
    queries: Vec<String>,
    alert_feeds: Vec<String>,
}

impl GoogleNewsRssAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        let queries = if cfg.google_news_rss_queries.is_empty() {
            DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
        } else {
            cfg.google_news_rss_queries.clone()
        };
        Self {
            fetcher,
            queries,
            alert_feeds: cfg.google_alerts_feeds.clone(),
        }
    }

    fn search_url(query: &str) -> Option<String> {
        reqwest::Url::parse_with_params(
            SEARCH_URL,
            &[("q", query), ("hl", "en-US"), ("gl", "TH"), ("ceid", "TH:en")],
        )
        .ok()
        .map(String::from)
    }

    async fn fetch_items(&self, url: &str) -> Result<Vec<RssItem>, PayloadError> {
        let xml = self.fetcher.text(url).await?;
        parse_feed(&xml)
    }

    /// Fetch all feeds; returns items and the number of feeds that failed.
    async fn fetch_all(&self, urls: &[String]) -> (Vec<RssItem>, usize) {
        let settled = join_all(urls.iter().map(|u| self.fetch_items(u))).await;
        let mut items = Vec::new();
        let mut failed = 0usize;
        for r in settled {
            match r {
                Ok(mut v) => items.append(&mut v),
                Err(e) => {
                    tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "feed failed");
                    failed += 1;
                }
            }
        }
        (items, failed)
    }
}

#[async_trait]
impl SourceAdapter for GoogleNewsRssAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if !self.fetcher.allow_live() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Enable ALLOW_LIVE_FETCH to activate free Google RSS news sync.",
                SOURCE_URL,
            ));
        }

        let query_urls: Vec<String> = self
            .queries
            .iter()
            .filter_map(|q| Self::search_url(q))
            .collect();
        let ((query_items, q_failed), (alert_items, a_failed)) = futures::join!(
            self.fetch_all(&query_urls),
            self.fetch_all(&self.alert_feeds)
        );

        let now = Utc::now();
        let mut news = normalize(query_items, "Google News RSS", now);
        news.extend(normalize(alert_items, "Google Alerts RSS", now));
        let news = dedup_and_cap(news, MAX_ITEMS);

        if news.is_empty() {
            return Ok(SyncResult::stale(
                SOURCE_ID,
                "Google RSS feeds returned no items. Keeping cached external news.",
                SOURCE_URL,
            ));
        }

        counter!("sync_news_items_total").increment(news.len() as u64);
        let failed = q_failed + a_failed;
        let message = if failed > 0 {
            format!(
                "Imported {} items from Google RSS ({failed} feed(s) failed).",
                news.len()
            )
        } else {
            format!("Imported {} items from Google RSS.", news.len())
        };

        Ok(SyncResult::live(SOURCE_ID, message, SOURCE_URL)
            .at(now)
            .with_news(news))
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"smart city" Thailand - Google News</title>
    <item>
      <title>Bangkok expands flood sensors</title>
      <link>https://news.example/a</link>
      <pubDate>Sat, 28 Feb 2026 10:00:00 GMT</pubDate>
      <description>&lt;a href="x"&gt;Bangkok&lt;/a&gt;&amp;nbsp;adds 200 sensors</description>
    </item>
    <item>
      <title>Bangkok expands flood sensors</title>
      <link>https://news.example/a</link>
      <pubDate>Sat, 28 Feb 2026 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Phuket transit pilot</title>
      <link>https://news.example/b</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_and_normalizes_feed() {
        let now = Utc::now();
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 3);

        let news = dedup_and_cap(normalize(items, "Google News RSS", now), MAX_ITEMS);
        assert_eq!(news.len(), 2);

        let first = &news[0];
        assert_eq!(first.kind, NewsKind::External);
        assert_eq!(first.city_slug.as_deref(), Some("bangkok"));
        assert_eq!(first.domain_slug.as_deref(), Some("environment"));
        assert_eq!(first.excerpt.en, "Bangkok adds 200 sensors");
        assert_eq!(first.published_at.to_rfc3339(), "2026-02-28T10:00:00+00:00");

        let second = &news[1];
        assert_eq!(second.domain_slug.as_deref(), Some("mobility"));
        assert_eq!(second.published_at, now);
        assert!(second.source.published_at.is_none());
    }

    #[test]
    fn cap_applies_after_dedup() {
        let now = Utc::now();
        let items: Vec<RssItem> = (0..15)
            .map(|i| RssItem {
                title: Some(format!("Story {i}")),
                link: Some(format!("https://news.example/{i}")),
                ..Default::default()
            })
            .collect();
        let news = dedup_and_cap(normalize(items, "Google Alerts RSS", now), MAX_ITEMS);
        assert_eq!(news.len(), MAX_ITEMS);
        assert!(news[0].id.starts_with("external-google-google-alerts-rss-"));
    }

    #[test]
    fn malformed_xml_is_a_payload_error() {
        assert!(matches!(
            parse_feed("<rss><channel>"),
            Err(PayloadError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn manual_without_live_fetch() {
        let a = GoogleNewsRssAdapter::new(&SyncConfig::default(), Fetcher::new(false));
        let r = a.sync().await.unwrap();
        assert_eq!(r.status, FreshnessStatus::Manual);
        assert!(r.news_items.is_empty());
    }
}
