//! Active-test resolution with a TTL cache.
//!
//! ## Responsibility
//! Answer "which test is live right now?" without re-querying the catalog on
//! every render. The latest published test id is cached for a TTL window and
//! explicitly invalidated whenever a record is saved, mirroring the original
//! day-long transient that was cleared on save.
//!
//! ## Guarantees
//! - Deterministic under an injected clock: callers pass `now_ms`
//!   explicitly; nothing here reads wall time.
//! - `0` is the "no active test" id, the same sentinel value the page-global
//!   signal and the cleanup guard use.
//! - TTL expiry is evaluated lazily on every lookup.

use tracing::debug;

use crate::catalog::TestCatalog;

/// Default cache lifetime: one day, as the original transient used.
pub const DEFAULT_TTL_MS: u64 = 86_400_000;

#[derive(Debug, Clone, Copy)]
struct CachedId {
    id: u64,
    inserted_ms: u64,
}

/// TTL cache over the latest-published-test query.
#[derive(Debug)]
pub struct ActiveTestCache {
    ttl_ms: u64,
    cached: Option<CachedId>,
}

impl Default for ActiveTestCache {
    fn default() -> Self {
        ActiveTestCache::new(DEFAULT_TTL_MS)
    }
}

impl ActiveTestCache {
    pub fn new(ttl_ms: u64) -> Self {
        ActiveTestCache {
            ttl_ms,
            cached: None,
        }
    }

    /// The latest published test id, or `0` when none exists.
    ///
    /// Serves from cache while the entry is younger than the TTL; otherwise
    /// re-queries the catalog and refreshes the entry. The `0` sentinel is
    /// cached like any other answer.
    pub fn latest_id(&mut self, catalog: &TestCatalog, now_ms: u64) -> u64 {
        if let Some(entry) = self.cached {
            if now_ms.saturating_sub(entry.inserted_ms) < self.ttl_ms {
                debug!(id = entry.id, "active test cache hit");
                return entry.id;
            }
        }

        let id = catalog.latest_published().map(|r| r.id).unwrap_or(0);
        self.cached = Some(CachedId {
            id,
            inserted_ms: now_ms,
        });
        debug!(id, "active test cache refreshed");
        id
    }

    /// Drop the cached entry. Call after any catalog save.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Resolve the active test for a given test type.
    ///
    /// Returns the latest published test's id only when that test's settings
    /// name `slug` as their type; an empty slug or a type mismatch resolves
    /// to `None`.
    pub fn active_test_of_type(
        &mut self,
        catalog: &TestCatalog,
        slug: &str,
        now_ms: u64,
    ) -> Option<u64> {
        if slug.is_empty() {
            return None;
        }

        let id = self.latest_id(catalog, now_ms);
        if id == 0 {
            return None;
        }

        let record = catalog.get(id)?;
        if record.settings.test_type != slug {
            return None;
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TestRecord, TestStatus};
    use crate::settings::TestSettings;

    fn catalog_with(id: u64, slug: &str, status: TestStatus) -> TestCatalog {
        let mut catalog = TestCatalog::new();
        catalog.insert(TestRecord {
            id,
            title: "t".to_string(),
            status,
            settings: TestSettings::new(slug),
        });
        catalog
    }

    #[test]
    fn test_latest_id_zero_when_empty() {
        let mut cache = ActiveTestCache::new(1_000);
        assert_eq!(cache.latest_id(&TestCatalog::new(), 0), 0);
    }

    #[test]
    fn test_latest_id_cached_within_ttl() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Published);
        assert_eq!(cache.latest_id(&catalog, 0), 7);

        // Catalog changes, but the cache still answers until the TTL lapses.
        let later = catalog_with(9, "hero", TestStatus::Published);
        assert_eq!(cache.latest_id(&later, 999), 7);
        assert_eq!(cache.latest_id(&later, 1_000), 9);
    }

    #[test]
    fn test_invalidate_forces_requery() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Published);
        assert_eq!(cache.latest_id(&catalog, 0), 7);

        let later = catalog_with(9, "hero", TestStatus::Published);
        cache.invalidate();
        assert_eq!(cache.latest_id(&later, 1), 9);
    }

    #[test]
    fn test_zero_sentinel_is_cached_too() {
        let mut cache = ActiveTestCache::new(1_000);
        assert_eq!(cache.latest_id(&TestCatalog::new(), 0), 0);

        // A test published inside the TTL window is not seen until expiry.
        let catalog = catalog_with(3, "hero", TestStatus::Published);
        assert_eq!(cache.latest_id(&catalog, 500), 0);
    }

    #[test]
    fn test_active_test_of_type_matches() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Published);
        assert_eq!(cache.active_test_of_type(&catalog, "hero", 0), Some(7));
    }

    #[test]
    fn test_active_test_of_type_mismatch_is_none() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Published);
        assert_eq!(cache.active_test_of_type(&catalog, "footer", 0), None);
    }

    #[test]
    fn test_active_test_of_type_empty_slug_is_none() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Published);
        assert_eq!(cache.active_test_of_type(&catalog, "", 0), None);
    }

    #[test]
    fn test_active_test_of_type_none_when_only_complete() {
        let mut cache = ActiveTestCache::new(1_000);
        let catalog = catalog_with(7, "hero", TestStatus::Complete);
        assert_eq!(cache.active_test_of_type(&catalog, "hero", 0), None);
    }
}
