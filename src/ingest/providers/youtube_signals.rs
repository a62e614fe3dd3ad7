//! Public YouTube channel feeds (Atom) as media-feed links and streams.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use quick_xml::de::from_str;
use serde::Deserialize;

use super::google_news_rss::clean_text;
use super::json_rows::parse_timestamp;
use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{PayloadError, SourceAdapter, SyncResult};
use crate::model::{MediaFeedItem, MediaKind, MediaStatus, SourceMeta};

const SOURCE_ID: &str = "youtube-signals";
const SOURCE_NAME: &str = "YouTube Signals";
const SOURCE_URL: &str = "https://developers.google.com/youtube/v3";
const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";
const MAX_ITEMS: usize = 6;

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub published: Option<String>,
    pub author: Option<FeedAuthor>,
    #[serde(default)]
    pub link: Vec<FeedLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedLink {
    #[serde(rename = "@href")]
    pub href: Option<String>,
}

pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, PayloadError> {
    let feed: AtomFeed = from_str(xml).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    Ok(feed.entry)
}

/// Media items from channel entries; a title mentioning "live" is a stream.
pub fn build_media(entries: Vec<FeedEntry>, fallback_url: &str, now: DateTime<Utc>) -> Vec<MediaFeedItem> {
    entries
        .into_iter()
        .take(MAX_ITEMS)
        .enumerate()
        .map(|(i, e)| {
            let title = e
                .title
                .as_deref()
                .map(clean_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| format!("YouTube signal {}", i + 1));
            let is_live = title.to_lowercase().contains("live");
            let url = e
                .link
                .iter()
                .find_map(|l| l.href.clone())
                .unwrap_or_else(|| fallback_url.to_string());
            let id = match e.id.as_deref().and_then(|v| v.strip_prefix("yt:video:")) {
                Some(video) => format!("youtube-media-{video}"),
                None => format!("youtube-media-feed-{i}"),
            };
            MediaFeedItem {
                id,
                kind: if is_live { MediaKind::Stream } else { MediaKind::Link },
                label: title,
                region: Some(
                    e.author
                        .and_then(|a| a.name)
                        .unwrap_or_else(|| "YouTube".to_string()),
                ),
                embed_url: None,
                external_url: Some(url.clone()),
                is_embeddable: false,
                status: if is_live { MediaStatus::Live } else { MediaStatus::Unknown },
                source: SourceMeta {
                    published_at: e.published.as_deref().and_then(parse_timestamp),
                    ..SourceMeta::live(SOURCE_NAME, url, now, 0.68)
                },
            }
        })
        .collect()
}

pub struct YoutubeSignalsAdapter {
    fetcher: Fetcher,
    channel_ids: Vec<String>,
}

impl YoutubeSignalsAdapter {
    pub fn new(cfg: &SyncConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            channel_ids: cfg.youtube_channel_ids.clone(),
        }
    }

    fn channel_feed_url(channel_id: &str) -> Option<String> {
        reqwest::Url::parse_with_params(FEED_URL, &[("channel_id", channel_id)])
            .ok()
            .map(String::from)
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Vec<FeedEntry>, PayloadError> {
        let url = Self::channel_feed_url(channel_id)
            .ok_or_else(|| PayloadError::Malformed(format!("channel id {channel_id}")))?;
        parse_feed(&self.fetcher.text(&url).await?)
    }
}

#[async_trait]
impl SourceAdapter for YoutubeSignalsAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        if !self.fetcher.allow_live() {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Enable ALLOW_LIVE_FETCH to activate YouTube signal monitoring.",
                SOURCE_URL,
            ));
        }
        let Some(first_channel) = self.channel_ids.first() else {
            return Ok(SyncResult::manual(
                SOURCE_ID,
                "Add YouTube channel IDs to monitor videos and livestream activity.",
                SOURCE_URL,
            ));
        };

        let settled = join_all(self.channel_ids.iter().map(|c| self.fetch_channel(c))).await;
        let mut entries = Vec::new();
        for r in settled {
            match r {
                Ok(mut v) => entries.append(&mut v),
                Err(e) => {
                    tracing::debug!(target: "sync", source_id = SOURCE_ID, error = %e, "channel feed failed")
                }
            }
        }

        let now = Utc::now();
        let media = build_media(
            entries,
            &format!("https://www.youtube.com/channel/{first_channel}"),
            now,
        );
        if media.is_empty() {
            return Ok(SyncResult::stale(
                SOURCE_ID,
                "YouTube monitoring is configured, but no recent channel items were returned.",
                SOURCE_URL,
            ));
        }

        Ok(SyncResult::live(
            SOURCE_ID,
            format!(
                "Imported {} YouTube video signals through public channel feeds.",
                media.len()
            ),
            SOURCE_URL,
        )
        .at(now)
        .with_media(media))
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FreshnessStatus;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC123"/>
  <id>yt:channel:UC123</id>
  <title>City Channel</title>
  <entry>
    <id>yt:video:abc123</id>
    <yt:videoId>abc123</yt:videoId>
    <title>LIVE: Bangkok flood command briefing</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
    <author><name>City Channel</name></author>
    <published>2026-02-27T08:00:00+00:00</published>
  </entry>
  <entry>
    <title>Smart bus depot tour</title>
  </entry>
</feed>"#;

    #[test]
    fn atom_entries_become_media_items() {
        let now = Utc::now();
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let media = build_media(entries, "https://www.youtube.com/channel/UC123", now);
        let live = &media[0];
        assert_eq!(live.id, "youtube-media-abc123");
        assert_eq!(live.kind, MediaKind::Stream);
        assert_eq!(live.status, MediaStatus::Live);
        assert_eq!(live.region.as_deref(), Some("City Channel"));
        assert_eq!(live.external_url.as_deref(), Some("https://www.youtube.com/watch?v=abc123"));
        assert!(live.source.published_at.is_some());

        let tour = &media[1];
        assert_eq!(tour.id, "youtube-media-feed-1");
        assert_eq!(tour.kind, MediaKind::Link);
        assert_eq!(tour.status, MediaStatus::Unknown);
        assert_eq!(tour.region.as_deref(), Some("YouTube"));
        assert_eq!(tour.external_url.as_deref(), Some("https://www.youtube.com/channel/UC123"));
    }

    #[tokio::test]
    async fn manual_until_live_fetch_and_channels() {
        let cfg = SyncConfig {
            youtube_channel_ids: vec!["UC123".into()],
            ..SyncConfig::default()
        };
        let r = YoutubeSignalsAdapter::new(&cfg, Fetcher::new(false)).sync().await.unwrap();
        assert_eq!(r.status, FreshnessStatus::Manual);

        let r = YoutubeSignalsAdapter::new(&SyncConfig::default(), Fetcher::new(true))
            .sync()
            .await
            .unwrap();
        assert_eq!(r.status, FreshnessStatus::Manual);
    }
}
