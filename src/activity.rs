//! activity.rs: capped in-memory log of per-source sync outcomes, newest first.

use std::collections::VecDeque;

use crate::model::ActivityLogItem;

pub const ACTIVITY_LOG_CAP: usize = 24;

#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityLogItem>,
    cap: usize,
}

impl ActivityLog {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Prepend a batch (kept in its given order) and drop the oldest overflow.
    pub fn prepend(&mut self, batch: Vec<ActivityLogItem>) {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.entries.truncate(self.cap);
    }

    pub fn snapshot(&self, limit: Option<usize>) -> Vec<ActivityLogItem> {
        let n = limit.unwrap_or(self.entries.len());
        self.entries.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FreshnessStatus;
    use chrono::Utc;

    fn entry(i: usize) -> ActivityLogItem {
        ActivityLogItem {
            id: format!("a{i}"),
            timestamp: Utc::now(),
            source_id: "s".into(),
            label: "s".into(),
            detail: String::new(),
            status: FreshnessStatus::Live,
        }
    }

    #[test]
    fn keeps_most_recent_entries() {
        let mut log = ActivityLog::default();
        log.prepend((0..20).map(entry).collect());
        log.prepend((20..30).map(entry).collect());

        assert_eq!(log.len(), ACTIVITY_LOG_CAP);
        let snap = log.snapshot(None);
        assert_eq!(snap[0].id, "a20");
        assert_eq!(snap[9].id, "a29");
        assert_eq!(snap[10].id, "a0");
        assert_eq!(snap.last().map(|e| e.id.as_str()), Some("a13"));
    }

    #[test]
    fn snapshot_respects_limit() {
        let mut log = ActivityLog::default();
        log.prepend((0..5).map(entry).collect());
        assert_eq!(log.snapshot(Some(2)).len(), 2);
        assert_eq!(log.snapshot(Some(50)).len(), 5);
    }
}
