//! # Source Health Registry
//! Latest status/message per source, plus the source catalog whose freshness
//! fields mirror it. A source's status only ever changes from its own result.

use crate::ingest::types::SyncResult;
use crate::model::{FreshnessStatus, SourceCategory, SourceHealthRecord, SourceRecord};

/// Number of catalog sources per freshness status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub live: u64,
    pub delayed: u64,
    pub stale: u64,
    pub manual: u64,
}

impl StatusCounts {
    /// Sources outside the fresh window (stale or delayed).
    pub fn needing_attention(&self) -> u64 {
        self.stale + self.delayed
    }
}

#[derive(Debug, Clone)]
pub struct HealthRegistry {
    records: Vec<SourceHealthRecord>,
    catalog: Vec<SourceRecord>,
}

impl HealthRegistry {
    pub fn new(catalog: Vec<SourceRecord>) -> Self {
        Self {
            records: Vec::new(),
            catalog,
        }
    }

    /// Overwrite the record (and catalog entry) for this result's source.
    /// Unknown sources are registered on first sight.
    pub fn record(&mut self, result: &SyncResult) {
        let rec = result.health_record();
        match self
            .records
            .iter_mut()
            .find(|r| r.source_id == rec.source_id)
        {
            Some(slot) => *slot = rec,
            None => self.records.push(rec),
        }

        match self.catalog.iter_mut().find(|s| s.id == result.source_id) {
            Some(source) => {
                source.freshness_status = result.status;
                source.last_checked_at = result.fetched_at;
                source.message = result.message.clone();
            }
            None => self.catalog.push(SourceRecord {
                id: result.source_id.clone(),
                name: result.source_id.clone(),
                category: SourceCategory::Other,
                url: result.source_url.clone(),
                freshness_status: result.status,
                last_checked_at: result.fetched_at,
                message: result.message.clone(),
            }),
        }
    }

    /// Record a whole batch. Returns one record per distinct source id in
    /// first-appearance order, holding that source's last result in the batch.
    pub fn apply_batch(&mut self, results: &[SyncResult]) -> Vec<SourceHealthRecord> {
        let mut out: Vec<SourceHealthRecord> = Vec::with_capacity(results.len());
        for result in results {
            self.record(result);
            let rec = result.health_record();
            match out.iter_mut().find(|r| r.source_id == rec.source_id) {
                Some(slot) => *slot = rec,
                None => out.push(rec),
            }
        }
        out
    }

    pub fn records(&self) -> &[SourceHealthRecord] {
        &self.records
    }

    pub fn get(&self, source_id: &str) -> Option<&SourceHealthRecord> {
        self.records.iter().find(|r| r.source_id == source_id)
    }

    pub fn catalog(&self) -> &[SourceRecord] {
        &self.catalog
    }

    pub fn display_name<'a>(&'a self, source_id: &'a str) -> &'a str {
        self.catalog
            .iter()
            .find(|s| s.id == source_id)
            .map(|s| s.name.as_str())
            .unwrap_or(source_id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for source in &self.catalog {
            match source.freshness_status {
                FreshnessStatus::Live => counts.live += 1,
                FreshnessStatus::Delayed => counts.delayed += 1,
                FreshnessStatus::Stale => counts.stale += 1,
                FreshnessStatus::Manual => counts.manual += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn only_reporting_sources_change() {
        let mut reg = HealthRegistry::new(seed::sources());
        let before = reg
            .catalog()
            .iter()
            .find(|s| s.id == "citydata")
            .cloned()
            .unwrap();

        reg.apply_batch(&[SyncResult::stale("google-news-rss", "down", "")]);

        let after = reg.catalog().iter().find(|s| s.id == "citydata").unwrap();
        assert_eq!(&before, after);
        let g = reg.catalog().iter().find(|s| s.id == "google-news-rss").unwrap();
        assert_eq!(g.freshness_status, FreshnessStatus::Stale);
    }

    #[test]
    fn absent_sources_keep_prior_record() {
        let mut reg = HealthRegistry::new(Vec::new());
        reg.apply_batch(&[
            SyncResult::live("a", "ok", ""),
            SyncResult::live("b", "ok", ""),
        ]);
        let out = reg.apply_batch(&[SyncResult::stale("a", "down", "")]);

        assert_eq!(out.len(), 1);
        assert_eq!(reg.records().len(), 2);
        assert_eq!(reg.get("b").map(|r| r.status), Some(FreshnessStatus::Live));
        assert_eq!(reg.get("a").map(|r| r.status), Some(FreshnessStatus::Stale));
    }

    #[test]
    fn duplicate_ids_in_batch_collapse_to_last() {
        let mut reg = HealthRegistry::new(Vec::new());
        let out = reg.apply_batch(&[
            SyncResult::live("a", "first", ""),
            SyncResult::live("b", "ok", ""),
            SyncResult::stale("a", "second", ""),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_id, "a");
        assert_eq!(out[0].message, "second");
    }

    #[test]
    fn unknown_source_is_registered() {
        let mut reg = HealthRegistry::new(seed::sources());
        let n = reg.catalog().len();
        reg.apply_batch(&[SyncResult::live("openaq", "ok", "https://openaq.org")]);
        assert_eq!(reg.catalog().len(), n + 1);
        assert_eq!(reg.display_name("openaq"), "openaq");
        assert_eq!(reg.display_name("citydata"), "CityData Thailand");
    }
}
