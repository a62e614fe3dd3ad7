use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};

use crate::ingest::types::{SourceAdapter, SyncResult};
use crate::model::{TimeSnapshot, TimeZoneReading};

const SOURCE_ID: &str = "time-sync";
const SOURCE_URL: &str =
    "https://www.nist.gov/pml/time-and-frequency-division/time-services/internet-time-service-its";

/// (label, zone name, UTC offset in hours). Fixed offsets; none of these zones observe DST.
const ZONES: &[(&str, &str, i32)] = &[
    ("Bangkok", "Asia/Bangkok", 7),
    ("UTC", "UTC", 0),
    ("Tokyo", "Asia/Tokyo", 9),
    ("Singapore", "Asia/Singapore", 8),
];

fn offset_hours(h: i32) -> FixedOffset {
    FixedOffset::east_opt(h * 3600).unwrap_or(Utc.fix())
}

pub fn time_snapshot_at(now: DateTime<Utc>) -> TimeSnapshot {
    let bangkok = now.with_timezone(&offset_hours(7));
    TimeSnapshot {
        updated_at: now,
        utc_iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        bangkok_iso: bangkok.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        zones: ZONES
            .iter()
            .map(|(label, zone, h)| TimeZoneReading {
                label: label.to_string(),
                time_zone: zone.to_string(),
                local_time: now.with_timezone(&offset_hours(*h)).format("%H:%M:%S").to_string(),
            })
            .collect(),
    }
}

/// Server clock snapshot. Always live.
#[derive(Debug, Default)]
pub struct TimeSyncAdapter;

#[async_trait]
impl SourceAdapter for TimeSyncAdapter {
    async fn sync(&self) -> Result<SyncResult> {
        let now = Utc::now();
        Ok(
            SyncResult::live(SOURCE_ID, "Server time snapshot refreshed.", SOURCE_URL)
                .at(now)
                .with_time(time_snapshot_at(now)),
        )
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
