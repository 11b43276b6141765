//! Test records and their status lifecycle.
//!
//! Stands in for the CMS content store the original plugin hung its records
//! off: each A/B test is a record with an id, a title, a status, and its
//! settings. `Complete` is the terminal status a retired test lands in.

use std::collections::BTreeMap;

use crate::settings::TestSettings;

/// Publication status of a test record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// Being drafted, never served.
    Draft,
    /// Live and eligible to be the active test.
    Published,
    /// Retired, either manually or by the unpublish schedule.
    Complete,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Draft => write!(f, "draft"),
            TestStatus::Published => write!(f, "published"),
            TestStatus::Complete => write!(f, "complete"),
        }
    }
}

/// One A/B test as the editor defined it.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub id: u64,
    pub title: String,
    pub status: TestStatus,
    pub settings: TestSettings,
}

// ---------------------------------------------------------------------------
// TestCatalog
// ---------------------------------------------------------------------------

/// Ordered collection of test records.
///
/// Ids are assigned by the caller and assumed monotonic, so "latest" is the
/// highest published id. Every mutation bumps a revision counter that cache
/// layers use as an invalidation token.
#[derive(Debug, Default)]
pub struct TestCatalog {
    records: BTreeMap<u64, TestRecord>,
    revision: u64,
}

impl TestCatalog {
    pub fn new() -> Self {
        TestCatalog::default()
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: TestRecord) {
        self.records.insert(record.id, record);
        self.revision += 1;
    }

    pub fn get(&self, id: u64) -> Option<&TestRecord> {
        self.records.get(&id)
    }

    /// Change a record's status. Returns `false` for an unknown id.
    pub fn update_status(&mut self, id: u64, status: TestStatus) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.status = status;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// The newest published record, if any.
    pub fn latest_published(&self) -> Option<&TestRecord> {
        self.records
            .values()
            .rev()
            .find(|r| r.status == TestStatus::Published)
    }

    /// Monotonic token bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, status: TestStatus) -> TestRecord {
        TestRecord {
            id,
            title: format!("Test {}", id),
            status,
            settings: TestSettings::new("hero"),
        }
    }

    #[test]
    fn test_latest_published_picks_highest_id() {
        let mut catalog = TestCatalog::new();
        catalog.insert(record(1, TestStatus::Published));
        catalog.insert(record(2, TestStatus::Published));
        catalog.insert(record(3, TestStatus::Draft));
        assert_eq!(catalog.latest_published().map(|r| r.id), Some(2));
    }

    #[test]
    fn test_latest_published_empty_catalog() {
        assert!(TestCatalog::new().latest_published().is_none());
    }

    #[test]
    fn test_latest_published_skips_complete() {
        let mut catalog = TestCatalog::new();
        catalog.insert(record(5, TestStatus::Complete));
        assert!(catalog.latest_published().is_none());
    }

    #[test]
    fn test_update_status_bumps_revision() {
        let mut catalog = TestCatalog::new();
        catalog.insert(record(1, TestStatus::Published));
        let before = catalog.revision();
        assert!(catalog.update_status(1, TestStatus::Complete));
        assert!(catalog.revision() > before);
        assert_eq!(catalog.get(1).map(|r| r.status), Some(TestStatus::Complete));
    }

    #[test]
    fn test_update_status_unknown_id() {
        let mut catalog = TestCatalog::new();
        let before = catalog.revision();
        assert!(!catalog.update_status(99, TestStatus::Complete));
        assert_eq!(catalog.revision(), before);
    }

    #[test]
    fn test_insert_replaces_existing_id() {
        let mut catalog = TestCatalog::new();
        catalog.insert(record(1, TestStatus::Draft));
        catalog.insert(record(1, TestStatus::Published));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get(1).map(|r| r.status),
            Some(TestStatus::Published)
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TestStatus::Draft.to_string(), "draft");
        assert_eq!(TestStatus::Published.to_string(), "published");
        assert_eq!(TestStatus::Complete.to_string(), "complete");
    }
}
