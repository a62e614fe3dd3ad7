//! # Seed state
//! Static snapshot every store starts from, so reads are servable before the
//! first sync cycle completes. Each call builds a fresh, independent copy.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;

use crate::ingest::providers::time_sync::time_snapshot_at;
use crate::model::*;

/// 2026-02-28T12:00:00Z
const SEEDED_AT_UNIX: i64 = 1_772_280_000;

/// Publisher whose projects count as official updates.
pub const OFFICIAL_PUBLISHER: &str = "Smart City Thailand Office";

/// Layer whose feature count is the tracked-city footprint.
pub const COVERAGE_LAYER_ID: &str = "smart-city-thailand";

pub fn seeded_at() -> DateTime<Utc> {
    DateTime::from_timestamp(SEEDED_AT_UNIX, 0).unwrap_or_default()
}

fn seed_meta(name: &str, url: &str, live: bool) -> SourceMeta {
    SourceMeta {
        source_name: name.to_string(),
        source_url: Some(url.to_string()),
        fetched_at: seeded_at(),
        published_at: Some(seeded_at()),
        freshness_status: if live {
            FreshnessStatus::Live
        } else {
            FreshnessStatus::Manual
        },
        confidence: if live { 0.88 } else { 0.72 },
        fallback_mode: if live {
            FallbackMode::Live
        } else {
            FallbackMode::Manual
        },
    }
}

const OFFICE_URL: &str = "https://www.depa.or.th/th/smart-city-plan/smart-city-office";

pub fn domains() -> Vec<DomainScorecard> {
    [
        ("environment", "สิ่งแวดล้อมอัจฉริยะ", "Smart Environment", "Air, water, and climate resilience performance.", 78, TrendDirection::Up),
        ("economy", "เศรษฐกิจอัจฉริยะ", "Smart Economy", "Investment, innovation clusters, and economic movement.", 73, TrendDirection::Up),
        ("mobility", "การเดินทางอัจฉริยะ", "Smart Mobility", "Connectivity, access, and transport performance.", 69, TrendDirection::Steady),
        ("energy", "พลังงานอัจฉริยะ", "Smart Energy", "Energy efficiency and alternative energy adoption.", 66, TrendDirection::Up),
        ("people", "คนอัจฉริยะ", "Smart People", "Skills, participation, and future-ready talent.", 71, TrendDirection::Up),
        ("living", "การใช้ชีวิตอัจฉริยะ", "Smart Living", "Quality of life, safety, and public-service access.", 75, TrendDirection::Steady),
        ("governance", "การบริหารภาครัฐอัจฉริยะ", "Smart Governance", "Open data, transparency, and response discipline.", 72, TrendDirection::Up),
    ]
    .into_iter()
    .map(|(slug, th, en, desc, score, trend)| DomainScorecard {
        id: format!("domain-{slug}"),
        slug: slug.to_string(),
        title: LocalizedText::new(th, en),
        description: LocalizedText::both(desc),
        score,
        trend,
    })
    .collect()
}

fn city(
    slug: &str,
    name: (&str, &str),
    region: &str,
    population: u64,
    focus: &str,
    scores: &[(&str, u32)],
) -> CityProfile {
    CityProfile {
        id: format!("city-{slug}"),
        slug: slug.to_string(),
        name: LocalizedText::new(name.0, name.1),
        region: LocalizedText::both(region),
        population,
        focus: LocalizedText::both(focus),
        scores: scores
            .iter()
            .map(|(d, s)| CityScore {
                domain_slug: d.to_string(),
                score: *s,
            })
            .collect(),
    }
}

pub fn cities() -> Vec<CityProfile> {
    vec![
        city("bangkok", ("กรุงเทพมหานคร", "Bangkok"), "Central", 10_539_000, "Flood response, mobility, and city-scale digital services.", &[("environment", 79), ("mobility", 74), ("governance", 77)]),
        city("phuket", ("ภูเก็ต", "Phuket"), "South", 417_000, "Smart tourism, safety, and infrastructure readiness.", &[("economy", 76), ("living", 74), ("governance", 70)]),
        city("khon-kaen", ("ขอนแก่น", "Khon Kaen"), "Northeast", 412_000, "Public transport and regional economic modernization.", &[("mobility", 73), ("economy", 72), ("people", 68)]),
        city("chiang-mai", ("เชียงใหม่", "Chiang Mai"), "North", 1_270_000, "Air quality, livability, and cultural innovation.", &[("environment", 74), ("living", 76), ("people", 71)]),
    ]
}

pub fn projects() -> Vec<ProjectRecord> {
    vec![
        ProjectRecord {
            id: "project-1".into(),
            slug: "bangkok-flood-command".into(),
            title: LocalizedText::new("ศูนย์สั่งการน้ำท่วมกรุงเทพ", "Bangkok Flood Command Grid"),
            city_slug: "bangkok".into(),
            domain_slug: "environment".into(),
            status: ProjectStatus::Active,
            completion_percent: 81,
            owner: LocalizedText::new("สำนักงานเมืองอัจฉริยะ", "Smart City Office"),
            summary: LocalizedText::both("Links rainfall, drainage, and field signals for faster flood response."),
            next_milestone: LocalizedText::both("Pilot district warning workflow in 10 districts next quarter."),
            updated_at: seeded_at(),
            source: seed_meta(OFFICIAL_PUBLISHER, OFFICE_URL, false),
        },
        ProjectRecord {
            id: "project-2".into(),
            slug: "phuket-tourism-mobility-loop".into(),
            title: LocalizedText::both("Phuket Tourism Mobility Loop"),
            city_slug: "phuket".into(),
            domain_slug: "mobility".into(),
            status: ProjectStatus::Watch,
            completion_percent: 58,
            owner: LocalizedText::both("Municipal and local partners"),
            summary: LocalizedText::both("Unifies mobility, tourism, and safety data into one operating view."),
            next_milestone: LocalizedText::both("Connect transport feeds and major tourist nodes."),
            updated_at: seeded_at(),
            source: seed_meta("CityData Thailand", "https://www.citydata.in.th", false),
        },
        ProjectRecord {
            id: "project-3".into(),
            slug: "khon-kaen-civic-transit".into(),
            title: LocalizedText::both("Khon Kaen Civic Transit Pulse"),
            city_slug: "khon-kaen".into(),
            domain_slug: "people".into(),
            status: ProjectStatus::Active,
            completion_percent: 67,
            owner: LocalizedText::both("City coalition and universities"),
            summary: LocalizedText::both("Tracks service access and mobility outcomes with public data."),
            next_milestone: LocalizedText::both("Publish public community-facing metrics board."),
            updated_at: seeded_at(),
            source: seed_meta("data.go.th", "https://data.go.th", false),
        },
    ]
}

pub fn news() -> Vec<NewsItem> {
    vec![
        NewsItem {
            id: "news-1".into(),
            slug: "official-quarterly-briefing".into(),
            title: LocalizedText::new(
                "สรุปสถานะเมืองอัจฉริยะประจำไตรมาส",
                "Quarterly Smart City Thailand operating brief published",
            ),
            excerpt: LocalizedText::both("Highlights program momentum, urgent projects, and cities requiring attention."),
            kind: NewsKind::Official,
            city_slug: None,
            domain_slug: None,
            published_at: seeded_at(),
            source: seed_meta(OFFICIAL_PUBLISHER, OFFICE_URL, false),
        },
        NewsItem {
            id: "news-2".into(),
            slug: "citydata-new-dashboard".into(),
            title: LocalizedText::both("CityData expands city dashboards and open datasets"),
            excerpt: LocalizedText::both("New datasets improve city comparison and policy analysis workflows."),
            kind: NewsKind::External,
            city_slug: None,
            domain_slug: None,
            published_at: seeded_at(),
            source: seed_meta("CityData Thailand", "https://www.citydata.in.th", true),
        },
        NewsItem {
            id: "news-3".into(),
            slug: "air-quality-watch".into(),
            title: LocalizedText::both("Northern air-quality watch remains elevated"),
            excerpt: LocalizedText::both("Environmental indicators remain a near-term pressure point."),
            kind: NewsKind::External,
            city_slug: Some("chiang-mai".into()),
            domain_slug: Some("environment".into()),
            published_at: seeded_at(),
            source: seed_meta(
                "Open-Meteo Air Quality",
                "https://open-meteo.com/en/docs/air-quality-api",
                true,
            ),
        },
    ]
}

pub fn sources() -> Vec<SourceRecord> {
    use SourceCategory::*;
    [
        ("citydata", "CityData Thailand", Catalog, "https://www.citydata.in.th", FreshnessStatus::Manual, "Catalog and city dashboard metadata awaiting the first CKAN sync."),
        ("data-go-th", "Open Government Data Thailand", Catalog, "https://data.go.th", FreshnessStatus::Manual, "Dataset-level adapters should be configured per resource."),
        ("urbanis", "The Urbanis", Catalog, "https://urbandata.theurbanis.com", FreshnessStatus::Manual, "Awaiting endpoint confirmation for machine-readable ingestion."),
        ("gistda-disaster", "GISTDA Disaster API", Geospatial, "https://disaster.gistda.or.th/services/open-api", FreshnessStatus::Manual, "Ready for map-layer enrichment when endpoint payloads are confirmed."),
        ("google-news-rss", "Google News RSS", News, "https://news.google.com", FreshnessStatus::Live, "Default free external news feed."),
        ("gdelt-signals", "GDELT Signals", News, "https://api.gdeltproject.org/api/v2/doc/doc", FreshnessStatus::Manual, "Global media monitoring activates once a DOC API query is configured."),
        ("youtube-signals", "YouTube Signals", News, "https://developers.google.com/youtube/v3", FreshnessStatus::Manual, "Channel feeds for video and livestream activity."),
        ("open-meteo-weather", "Open-Meteo Forecast", Environment, "https://open-meteo.com/en/docs", FreshnessStatus::Live, "Default weather source."),
        ("open-meteo-air", "Open-Meteo Air Quality", Environment, "https://open-meteo.com/en/docs/air-quality-api", FreshnessStatus::Live, "Default air-quality source."),
        ("time-sync", "Server Time Sync", Time, "https://www.nist.gov/pml/time-and-frequency-division/time-services/internet-time-service-its", FreshnessStatus::Live, "Server clock powers UTC and multi-time-zone views."),
        ("live-media", "Curated Media Feeds", News, "https://www.youtube.com", FreshnessStatus::Manual, "Embed-safe and link-safe live media references for the monitor."),
    ]
    .into_iter()
    .map(|(id, name, category, url, status, message)| SourceRecord {
        id: id.to_string(),
        name: name.to_string(),
        category,
        url: url.to_string(),
        freshness_status: status,
        last_checked_at: seeded_at(),
        message: message.to_string(),
    })
    .collect()
}

pub fn map_layers() -> Vec<MapLayerConfig> {
    use LayerKind::*;
    [
        (COVERAGE_LAYER_ID, "Smart City TH", true, "#ff5b57", Dataset, &["national"][..], "citydata", 42),
        ("projects", "Projects", true, "#0057ff", Signal, &["bangkok", "national"][..], "citydata", 30),
        ("news", "News", true, "#00a16a", Signal, &["bangkok", "national"][..], "google-news-rss", 35),
        ("weather", "Weather", true, "#00a3b4", Signal, &["bangkok", "national"][..], "open-meteo-weather", 22),
        ("pollution", "Pollution", true, "#c1254a", Signal, &["bangkok", "national"][..], "open-meteo-air", 24),
        ("disaster", "Disaster", false, "#d64200", Signal, &["national"][..], "gistda-disaster", 16),
    ]
    .into_iter()
    .map(|(id, label, active, color, kind, views, source_id, z)| MapLayerConfig {
        id: id.to_string(),
        label: LocalizedText::both(label),
        active,
        color: color.to_string(),
        kind,
        default_views: views.iter().map(|v| v.to_string()).collect(),
        source_id: source_id.to_string(),
        legend_label: Some(label.to_string()),
        z_index: Some(z),
    })
    .collect()
}

pub fn map_feature_collections() -> Vec<MapFeatureCollection> {
    let meta = seed_meta(
        "CityData Smart City Thailand",
        "https://www.citydata.in.th/en/smart-city-thailand/",
        true,
    );
    let features = [
        ("Bangkok Metropolitan Smart City", "Bangkok", "Central", 100.5018, 13.7563),
        ("Nonthaburi", "Nonthaburi", "Central", 100.5144, 13.8591),
        ("Pathum Thani", "Pathum Thani", "Central", 100.525, 14.0208),
        ("Phra Nakhon Si Ayutthaya", "Ayutthaya", "Central", 100.5689, 14.3532),
        ("Nakhon Pathom", "Nakhon Pathom", "Central", 100.0622, 13.8199),
        ("Kanchanaburi", "Kanchanaburi", "West", 99.5328, 14.0228),
        ("Chon Buri - Si Racha", "Si Racha", "East", 100.9311, 13.1737),
        ("Pattaya", "Pattaya", "East", 100.8825, 12.9236),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, city, region, lon, lat))| {
        let mut properties = BTreeMap::new();
        properties.insert("city".to_string(), PropertyValue::from(city));
        properties.insert("region".to_string(), PropertyValue::from(region));
        GeoFeatureRecord {
            id: format!("smart-city-th-{}", i + 1),
            layer_id: COVERAGE_LAYER_ID.to_string(),
            geometry_type: GeometryType::Point,
            coordinates: json!([lon, lat]),
            title: title.to_string(),
            description: None,
            properties,
            source: meta.clone(),
        }
    })
    .collect();

    vec![MapFeatureCollection {
        layer_id: COVERAGE_LAYER_ID.to_string(),
        updated_at: seeded_at(),
        features,
        bounds: Some([7.0, 98.2, 19.95, 104.9]),
        source: meta,
    }]
}

pub fn media_feeds() -> Vec<MediaFeedItem> {
    [
        ("media-thai-pbs", MediaKind::Link, "Thai PBS Live", "Thailand", "https://www.thaipbs.or.th/live", MediaStatus::Live),
        ("media-tnn16", MediaKind::Link, "TNN16 Live", "Thailand", "https://www.tnnthailand.com/live", MediaStatus::Live),
        ("media-youtube-smart-city", MediaKind::Stream, "Smart City Talks", "Public", "https://www.youtube.com/results?search_query=smart+city+thailand+live", MediaStatus::Unknown),
    ]
    .into_iter()
    .map(|(id, kind, label, region, url, status)| MediaFeedItem {
        id: id.to_string(),
        kind,
        label: label.to_string(),
        region: Some(region.to_string()),
        embed_url: None,
        external_url: Some(url.to_string()),
        is_embeddable: false,
        status,
        source: seed_meta("Curated Media Feeds", url, false),
    })
    .collect()
}

pub fn resilience() -> ResilienceSnapshot {
    ResilienceSnapshot {
        updated_at: seeded_at(),
        weather_summary: LocalizedText::new(
            "กรุงเทพฯ 31°C มีเมฆบางส่วน ลมปานกลาง",
            "Bangkok 31C, partly cloudy, moderate wind.",
        ),
        pollution_summary: LocalizedText::both("National AQI snapshot 68 | North remains under watch."),
        warnings: vec![
            LocalizedText::new(
                "เฝ้าระวังฝนสะสมเขตลุ่มต่ำ",
                "Watch low-lying areas for cumulative rainfall.",
            ),
            LocalizedText::new(
                "เชียงใหม่ควรสื่อสาร PM2.5 แบบรายวัน",
                "Chiang Mai should continue daily PM2.5 advisories.",
            ),
        ],
        weather_temperature_c: 31.0,
        aqi: 68,
        source: seed_meta("Open-Meteo", "https://open-meteo.com/en/docs", true),
    }
}

pub fn briefing() -> BriefingNote {
    BriefingNote {
        id: "briefing-1".into(),
        headline: LocalizedText::both(
            "Today: Progress is moving, but resilience and air quality still require attention.",
        ),
        body: LocalizedText::both(
            "Core cities are advancing in governance and service delivery, while air quality and water response remain the main watchpoints.",
        ),
        updated_at: seeded_at(),
        source: seed_meta(OFFICIAL_PUBLISHER, OFFICE_URL, false),
    }
}

pub fn social_listening() -> SocialListeningSnapshot {
    SocialListeningSnapshot {
        updated_at: seeded_at(),
        mention_count: 8,
        sentiment_score: 58,
        source_count: 3,
        positive_share: 0.56,
        dominant_source: "Google News RSS".into(),
        top_terms: vec!["flood".into(), "mobility".into(), "air".into()],
        source: seed_meta("Google News RSS", "https://news.google.com", false),
    }
}

pub fn official_impact() -> OfficialImpactSnapshot {
    OfficialImpactSnapshot {
        updated_at: seeded_at(),
        official_updates: 2,
        live_sources: 4,
        tracked_cities: 8,
        public_signals: 5,
        latest_headline: briefing().headline,
        source: seed_meta(OFFICIAL_PUBLISHER, OFFICE_URL, false),
    }
}

pub fn market() -> MarketSnapshot {
    MarketSnapshot {
        updated_at: seeded_at(),
        items: Vec::new(),
        source: seed_meta("Market Context", "https://api.coingecko.com", false),
    }
}

pub fn time() -> TimeSnapshot {
    time_snapshot_at(seeded_at())
}
