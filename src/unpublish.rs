//! Scheduled test retirement.
//!
//! A test with an end date is retired automatically: its record transitions
//! to [`TestStatus::Complete`] once the end date passes. This module keeps
//! the pending retirement events — at most one per test — and applies the
//! due ones when the host's scheduler ticks. Registering and driving that
//! external tick is the host's concern, not this crate's.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catalog::{TestCatalog, TestRecord, TestStatus};

/// Pending retirement events, keyed by test id.
#[derive(Debug, Default)]
pub struct UnpublishSchedule {
    events: HashMap<u64, u64>,
}

impl UnpublishSchedule {
    pub fn new() -> Self {
        UnpublishSchedule::default()
    }

    /// Schedule retirement of `test_id` at `run_at` (Unix seconds).
    ///
    /// Any event already pending for the same test is replaced, so editing a
    /// test's end date reschedules rather than stacking events.
    pub fn schedule(&mut self, test_id: u64, run_at: u64) {
        if let Some(previous) = self.events.insert(test_id, run_at) {
            debug!(test_id, previous, run_at, "replaced pending retirement");
        } else {
            debug!(test_id, run_at, "scheduled retirement");
        }
    }

    /// Remove any pending event for `test_id`. Returns `true` if one existed.
    pub fn unschedule(&mut self, test_id: u64) -> bool {
        self.events.remove(&test_id).is_some()
    }

    pub fn next_scheduled(&self, test_id: u64) -> Option<u64> {
        self.events.get(&test_id).copied()
    }

    /// Sync the pending event with a just-saved record: an end date
    /// schedules (or reschedules) retirement, a removed end date clears any
    /// stale event.
    pub fn sync_record(&mut self, record: &TestRecord) {
        match record.settings.end_date {
            Some(run_at) => self.schedule(record.id, run_at),
            None => {
                if self.unschedule(record.id) {
                    debug!(test_id = record.id, "end date removed, retirement cancelled");
                }
            }
        }
    }

    /// Ids of every event due at or before `now`, in ascending id order.
    pub fn due(&self, now: u64) -> Vec<u64> {
        let mut due: Vec<u64> = self
            .events
            .iter()
            .filter(|(_, &run_at)| run_at <= now)
            .map(|(&id, _)| id)
            .collect();
        due.sort_unstable();
        due
    }

    /// Retire every due test: transition its record to `Complete` and drop
    /// the event. Ids with no catalog record are dropped silently. Returns
    /// the number of records transitioned.
    pub fn run_due(&mut self, catalog: &mut TestCatalog, now: u64) -> usize {
        let mut retired = 0;
        for id in self.due(now) {
            self.events.remove(&id);
            if catalog.update_status(id, TestStatus::Complete) {
                info!(test_id = id, "test retired");
                retired += 1;
            }
        }
        retired
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TestSettings;

    fn published(id: u64, end_date: Option<u64>) -> TestRecord {
        let mut settings = TestSettings::new("hero");
        settings.end_date = end_date;
        TestRecord {
            id,
            title: format!("Test {}", id),
            status: TestStatus::Published,
            settings,
        }
    }

    #[test]
    fn test_schedule_replaces_existing_event() {
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(1, 100);
        schedule.schedule(1, 200);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.next_scheduled(1), Some(200));
    }

    #[test]
    fn test_sync_record_with_end_date_schedules() {
        let mut schedule = UnpublishSchedule::new();
        schedule.sync_record(&published(3, Some(500)));
        assert_eq!(schedule.next_scheduled(3), Some(500));
    }

    #[test]
    fn test_sync_record_without_end_date_cancels() {
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(3, 500);
        schedule.sync_record(&published(3, None));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_due_boundary_inclusive() {
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(1, 100);
        assert!(schedule.due(99).is_empty());
        assert_eq!(schedule.due(100), vec![1]);
    }

    #[test]
    fn test_run_due_retires_and_removes_event() {
        let mut catalog = TestCatalog::new();
        catalog.insert(published(1, Some(100)));
        let mut schedule = UnpublishSchedule::new();
        schedule.sync_record(catalog.get(1).unwrap());

        assert_eq!(schedule.run_due(&mut catalog, 150), 1);
        assert_eq!(catalog.get(1).map(|r| r.status), Some(TestStatus::Complete));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_run_due_leaves_future_events() {
        let mut catalog = TestCatalog::new();
        catalog.insert(published(1, Some(100)));
        catalog.insert(published(2, Some(900)));
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(1, 100);
        schedule.schedule(2, 900);

        assert_eq!(schedule.run_due(&mut catalog, 500), 1);
        assert_eq!(schedule.next_scheduled(2), Some(900));
        assert_eq!(
            catalog.get(2).map(|r| r.status),
            Some(TestStatus::Published)
        );
    }

    #[test]
    fn test_run_due_unknown_id_skipped_silently() {
        let mut catalog = TestCatalog::new();
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(42, 10);

        assert_eq!(schedule.run_due(&mut catalog, 20), 0);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_run_due_nothing_due() {
        let mut catalog = TestCatalog::new();
        catalog.insert(published(1, Some(100)));
        let mut schedule = UnpublishSchedule::new();
        schedule.schedule(1, 100);

        assert_eq!(schedule.run_due(&mut catalog, 50), 0);
        assert_eq!(schedule.len(), 1);
    }
}
