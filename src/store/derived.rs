//! # Derived indicators
//! Pure recomputation of the composite indicators (social listening, change
//! pulse, official impact) from post-fusion state. No I/O, no locking.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::health::StatusCounts;
use crate::ingest::types::SocialSignal;
use crate::model::*;
use crate::seed::{COVERAGE_LAYER_ID, OFFICIAL_PUBLISHER};

use super::StoreState;

pub const MEDIA_WATCH_AT: u64 = 10;
pub const MEDIA_ALERT_AT: u64 = 20;
pub const AQI_WATCH_AT: u32 = 60;
pub const AQI_ALERT_AT: u32 = 90;
pub const MENTIONS_POSITIVE_AT: u64 = 12;

const FALLBACK_DOMINANT_SOURCE: &str = "Live External Signals";

const COMMON_TERMS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "into", "city", "smart", "thailand",
    "depa",
];

/// What the social-listening snapshot is derived from this cycle.
#[derive(Debug)]
pub enum SocialBasis<'a> {
    /// At least one adapter reported a signal.
    Observed(Vec<SocialSignal>),
    /// No signal this cycle: estimate from external news and live media.
    Heuristic {
        external_news: Vec<&'a NewsItem>,
        live_media: Vec<&'a MediaFeedItem>,
    },
}

/// Signals supplied by this cycle's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounts {
    pub external_news: u64,
    pub map_updates: u64,
    pub project_changes: u64,
}

impl CycleCounts {
    pub fn total(&self) -> u64 {
        self.external_news + self.map_updates + self.project_changes
    }
}

/// Half-up rounding to an integer.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Two-decimal rounding.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Top five most frequent whitespace-separated terms (lowercased). Ties keep
/// first-seen order.
pub fn top_terms<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        for term in value.to_lowercase().split_whitespace() {
            let n = counts.entry(term.to_string()).or_insert(0);
            if *n == 0 {
                order.push(term.to_string());
            }
            *n += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|t| {
            let n = counts.get(&t).copied().unwrap_or(0);
            (t, n)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(5).map(|(t, _)| t).collect()
}

fn news_tokens(items: &[&NewsItem]) -> Vec<String> {
    static RE_STRIP: OnceCell<Regex> = OnceCell::new();
    let re = RE_STRIP.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("strip regex"));

    items
        .iter()
        .flat_map(|item| {
            let text = format!("{} {}", item.title.en, item.excerpt.en).to_lowercase();
            re.replace_all(&text, " ")
                .split_whitespace()
                .filter(|t| t.len() > 2 && !COMMON_TERMS.contains(t))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Resolve the social-listening snapshot for this cycle.
pub fn resolve_social_listening(
    basis: SocialBasis<'_>,
    previous: &SocialListeningSnapshot,
    now: DateTime<Utc>,
) -> SocialListeningSnapshot {
    match basis {
        SocialBasis::Observed(signals) => observed_snapshot(&signals, previous, now),
        SocialBasis::Heuristic {
            external_news,
            live_media,
        } => heuristic_snapshot(&external_news, &live_media, previous, now),
    }
}

fn observed_snapshot(
    signals: &[SocialSignal],
    previous: &SocialListeningSnapshot,
    now: DateTime<Utc>,
) -> SocialListeningSnapshot {
    let weight_of = |s: &SocialSignal| s.mention_count.max(1) as f64;
    let weight: f64 = signals.iter().map(weight_of).sum::<f64>().max(1.0);
    let weighted_sentiment: f64 = signals
        .iter()
        .map(|s| s.sentiment_score * weight_of(s))
        .sum();
    let weighted_positive: f64 = signals
        .iter()
        .map(|s| s.positive_share * weight_of(s))
        .sum();

    // max_by_key returns the last maximum; scan manually so ties keep the first.
    let mut dominant = signals.first();
    for s in signals {
        if dominant.is_some_and(|d| s.mention_count > d.mention_count) {
            dominant = Some(s);
        }
    }

    let dominant_source = dominant
        .map(|d| d.dominant_source.clone())
        .unwrap_or_else(|| previous.dominant_source.clone());
    let source_name = dominant
        .map(|d| d.source_name.clone())
        .unwrap_or_else(|| previous.source.source_name.clone());

    SocialListeningSnapshot {
        updated_at: now,
        mention_count: signals.iter().map(|s| s.mention_count).sum(),
        sentiment_score: round_half_up(weighted_sentiment / weight),
        source_count: signals.iter().map(|s| s.source_count).sum(),
        positive_share: round2(weighted_positive / weight).clamp(0.0, 1.0),
        dominant_source,
        top_terms: top_terms(
            signals
                .iter()
                .flat_map(|s| s.top_terms.iter().map(String::as_str)),
        ),
        source: SourceMeta {
            source_name,
            source_url: previous.source.source_url.clone(),
            fetched_at: now,
            published_at: Some(now),
            freshness_status: FreshnessStatus::Live,
            confidence: 0.78,
            fallback_mode: FallbackMode::Live,
        },
    }
}

fn heuristic_snapshot(
    external_news: &[&NewsItem],
    live_media: &[&MediaFeedItem],
    previous: &SocialListeningSnapshot,
    now: DateTime<Utc>,
) -> SocialListeningSnapshot {
    let mention_count = (external_news.len() + live_media.len()) as u64;
    let has_mentions = mention_count > 0;

    let dominant_source = external_news
        .first()
        .map(|n| n.source.source_name.clone())
        .or_else(|| live_media.first().map(|m| m.source.source_name.clone()))
        .unwrap_or_else(|| FALLBACK_DOMINANT_SOURCE.to_string());

    let distinct: HashSet<&str> = external_news
        .iter()
        .map(|n| n.source.source_name.as_str())
        .chain(live_media.iter().map(|m| m.source.source_name.as_str()))
        .collect();

    let source_url = external_news
        .first()
        .and_then(|n| n.source.source_url.clone())
        .or_else(|| previous.source.source_url.clone());

    let tokens = news_tokens(external_news);

    SocialListeningSnapshot {
        updated_at: now,
        mention_count,
        sentiment_score: (32 + mention_count * 4).min(85) as i64,
        source_count: distinct.len() as u64,
        positive_share: round2((0.42 + mention_count as f64 * 0.02).min(0.85)),
        dominant_source: dominant_source.clone(),
        top_terms: top_terms(tokens.iter().map(String::as_str)),
        source: SourceMeta {
            source_name: dominant_source,
            source_url,
            fetched_at: now,
            published_at: Some(now),
            freshness_status: if has_mentions {
                FreshnessStatus::Live
            } else {
                FreshnessStatus::Manual
            },
            confidence: if has_mentions { 0.61 } else { 0.42 },
            fallback_mode: if has_mentions {
                FallbackMode::Cached
            } else {
                FallbackMode::Manual
            },
        },
    }
}

pub fn media_spike_state(mentions: u64) -> ThresholdState {
    if mentions >= MEDIA_ALERT_AT {
        ThresholdState::Alert
    } else if mentions >= MEDIA_WATCH_AT {
        ThresholdState::Watch
    } else {
        ThresholdState::Ok
    }
}

pub fn stale_source_state(counts: StatusCounts) -> ThresholdState {
    if counts.stale > 1 {
        ThresholdState::Alert
    } else if counts.stale > 0 || counts.delayed > 0 {
        ThresholdState::Watch
    } else {
        ThresholdState::Ok
    }
}

pub fn air_quality_state(aqi: u32) -> ThresholdState {
    if aqi >= AQI_ALERT_AT {
        ThresholdState::Alert
    } else if aqi >= AQI_WATCH_AT {
        ThresholdState::Watch
    } else {
        ThresholdState::Ok
    }
}

pub fn change_pulse(
    cycle: CycleCounts,
    sources: StatusCounts,
    social: &SocialListeningSnapshot,
    resilience: &ResilienceSnapshot,
    now: DateTime<Utc>,
) -> ChangePulse {
    let new_signals = cycle.total();
    let warning_count = resilience.warnings.len() as u64;
    let attention = sources.needing_attention();

    let items = vec![
        ChangePulseItem {
            id: "change-new-signals".into(),
            label: LocalizedText::new("สัญญาณใหม่", "New Signals"),
            value: new_signals,
            tone: if new_signals > 0 { Tone::Positive } else { Tone::Neutral },
            detail: LocalizedText::new(
                format!(
                    "ข่าว {} | แผนที่ {} | โครงการ {}",
                    cycle.external_news, cycle.map_updates, cycle.project_changes
                ),
                format!(
                    "{} news | {} map updates | {} project changes",
                    cycle.external_news, cycle.map_updates, cycle.project_changes
                ),
            ),
        },
        ChangePulseItem {
            id: "change-live-sources".into(),
            label: LocalizedText::new("แหล่งข้อมูลสด", "Live Sources"),
            value: sources.live,
            tone: if sources.stale > 0 { Tone::Warning } else { Tone::Neutral },
            detail: LocalizedText::new(
                format!("{attention} แหล่งข้อมูลต้องติดตาม"),
                format!("{attention} source(s) need attention"),
            ),
        },
        ChangePulseItem {
            id: "change-social".into(),
            label: LocalizedText::new("การกล่าวถึง", "Mentions"),
            value: social.mention_count,
            tone: if social.mention_count >= MENTIONS_POSITIVE_AT {
                Tone::Positive
            } else {
                Tone::Neutral
            },
            detail: LocalizedText::new(
                format!("แหล่งหลัก: {}", social.dominant_source),
                format!("Lead source: {}", social.dominant_source),
            ),
        },
        ChangePulseItem {
            id: "change-alerts".into(),
            label: LocalizedText::new("จุดเฝ้าระวัง", "Watchpoints"),
            value: warning_count,
            tone: if warning_count > 0 { Tone::Warning } else { Tone::Neutral },
            detail: resilience
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| LocalizedText::new("ไม่มีการเตือนเพิ่มเติม", "No active warnings")),
        },
    ];

    let thresholds = vec![
        ChangePulseThreshold {
            id: "threshold-media".into(),
            label: LocalizedText::new("สัญญาณสื่อ", "Media Spike"),
            state: media_spike_state(social.mention_count),
            detail: LocalizedText::new(
                "ติดตามเมื่อจำนวนการกล่าวถึงเพิ่มขึ้นเร็ว",
                "Escalate when mentions rise sharply",
            ),
        },
        ChangePulseThreshold {
            id: "threshold-stale".into(),
            label: LocalizedText::new("ข้อมูลล่าช้า", "Stale Sources"),
            state: stale_source_state(sources),
            detail: LocalizedText::new(
                format!("{attention} แหล่งข้อมูลนอกกรอบสด"),
                format!("{attention} sources outside the fresh window"),
            ),
        },
        ChangePulseThreshold {
            id: "threshold-air".into(),
            label: LocalizedText::new("คุณภาพอากาศ", "Air Quality"),
            state: air_quality_state(resilience.aqi),
            detail: LocalizedText::new(
                format!("AQI ปัจจุบัน {}", resilience.aqi),
                format!("Current AQI {}", resilience.aqi),
            ),
        },
    ];

    ChangePulse {
        updated_at: now,
        items,
        thresholds,
    }
}

/// Tracked-city footprint: coverage layer size, else the static city count.
pub fn tracked_cities(state: &StoreState) -> u64 {
    state
        .map_collection(COVERAGE_LAYER_ID)
        .map(|c| c.features.len())
        .unwrap_or(state.cities.len()) as u64
}

pub fn official_impact(
    state: &StoreState,
    sources: StatusCounts,
    now: DateTime<Utc>,
) -> OfficialImpactSnapshot {
    let official_news = state
        .news
        .iter()
        .filter(|n| n.kind == NewsKind::Official)
        .count();
    let official_projects = state
        .projects
        .iter()
        .filter(|p| p.source.source_name == OFFICIAL_PUBLISHER)
        .count();
    let external_news = state
        .news
        .iter()
        .filter(|n| n.kind == NewsKind::External)
        .count();

    let previous = &state.official_impact;
    OfficialImpactSnapshot {
        updated_at: now,
        official_updates: (official_news + official_projects) as u64,
        live_sources: sources.live,
        tracked_cities: tracked_cities(state),
        public_signals: (external_news + state.media_feeds.len()) as u64,
        latest_headline: state.briefing.headline.clone(),
        source: SourceMeta {
            fetched_at: now,
            published_at: Some(now),
            freshness_status: if sources.stale > 0 {
                FreshnessStatus::Delayed
            } else {
                FreshnessStatus::Live
            },
            ..previous.source.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn signal(mentions: u64, score: f64, share: f64, name: &str, terms: &[&str]) -> SocialSignal {
        SocialSignal {
            mention_count: mentions,
            sentiment_score: score,
            source_count: 1,
            positive_share: share,
            dominant_source: format!("{name}-lead"),
            top_terms: terms.iter().map(|t| t.to_string()).collect(),
            source_name: name.to_string(),
        }
    }

    #[test]
    fn observed_sentiment_is_mentions_weighted() {
        let prev = seed::social_listening();
        let signals = vec![
            signal(3, 70.0, 0.7, "a", &["flood"]),
            signal(0, 40.0, 0.2, "b", &["air"]),
            signal(6, 55.0, 0.5, "c", &["flood", "air"]),
        ];
        let snap = resolve_social_listening(SocialBasis::Observed(signals), &prev, Utc::now());

        // (70*3 + 40*1 + 55*6) / 10 = 58
        assert_eq!(snap.sentiment_score, 58);
        // (0.7*3 + 0.2*1 + 0.5*6) / 10 = 0.53
        assert!((snap.positive_share - 0.53).abs() < 1e-9);
        assert_eq!(snap.mention_count, 9);
        assert_eq!(snap.source_count, 3);
        assert_eq!(snap.dominant_source, "c-lead");
        assert_eq!(snap.top_terms, vec!["flood", "air"]);
    }

    #[test]
    fn observed_rounds_half_up() {
        let prev = seed::social_listening();
        let signals = vec![signal(1, 50.0, 0.5, "a", &[]), signal(1, 51.0, 0.5, "b", &[])];
        let snap = resolve_social_listening(SocialBasis::Observed(signals), &prev, Utc::now());
        assert_eq!(snap.sentiment_score, 51);
        assert_eq!(snap.dominant_source, "a-lead");
    }

    #[test]
    fn heuristic_with_no_mentions_is_manual() {
        let prev = seed::social_listening();
        let snap = resolve_social_listening(
            SocialBasis::Heuristic {
                external_news: vec![],
                live_media: vec![],
            },
            &prev,
            Utc::now(),
        );
        assert_eq!(snap.mention_count, 0);
        assert_eq!(snap.sentiment_score, 32);
        assert!((snap.positive_share - 0.42).abs() < 1e-9);
        assert_eq!(snap.source.freshness_status, FreshnessStatus::Manual);
        assert_eq!(snap.dominant_source, FALLBACK_DOMINANT_SOURCE);
    }

    #[test]
    fn heuristic_caps_sentiment_and_share() {
        let prev = seed::social_listening();
        let news = seed::news();
        let externals: Vec<&NewsItem> = std::iter::repeat(&news[1]).take(30).collect();
        let snap = resolve_social_listening(
            SocialBasis::Heuristic {
                external_news: externals,
                live_media: vec![],
            },
            &prev,
            Utc::now(),
        );
        assert_eq!(snap.mention_count, 30);
        assert_eq!(snap.sentiment_score, 85);
        assert!((snap.positive_share - 0.85).abs() < 1e-9);
        assert_eq!(snap.source_count, 1);
        assert_eq!(snap.source.freshness_status, FreshnessStatus::Live);
        assert!(!snap.top_terms.contains(&"city".to_string()));
    }

    #[test]
    fn media_spike_boundaries() {
        assert_eq!(media_spike_state(9), ThresholdState::Ok);
        assert_eq!(media_spike_state(10), ThresholdState::Watch);
        assert_eq!(media_spike_state(19), ThresholdState::Watch);
        assert_eq!(media_spike_state(20), ThresholdState::Alert);
    }

    #[test]
    fn stale_and_air_boundaries() {
        let mut c = StatusCounts::default();
        assert_eq!(stale_source_state(c), ThresholdState::Ok);
        c.stale = 1;
        assert_eq!(stale_source_state(c), ThresholdState::Watch);
        c.stale = 2;
        assert_eq!(stale_source_state(c), ThresholdState::Alert);

        assert_eq!(air_quality_state(59), ThresholdState::Ok);
        assert_eq!(air_quality_state(60), ThresholdState::Watch);
        assert_eq!(air_quality_state(89), ThresholdState::Watch);
        assert_eq!(air_quality_state(90), ThresholdState::Alert);
    }

    #[test]
    fn top_terms_ranks_by_frequency() {
        let terms = top_terms(["b a", "a c", "a b", "d e f"]);
        assert_eq!(terms, vec!["a", "b", "c", "d", "e"]);
    }
}
