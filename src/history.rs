//! History strip
//!
//! Most-recent-first list of prior days that have a snapshot. The walk
//! starts the day before the excluded day and stops at whichever bound hits
//! first: `max_results` entries found, or `max_lookback_days` days scanned.
//! Days without a snapshot cost a lookback day but not a result slot.

use serde::Serialize;

use crate::calendar::DateKey;
use crate::grid::Grid;
use crate::snapshot::SnapshotStore;
use crate::storage::KeyValueStore;

/// One thumbnail in the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub date: DateKey,
    pub grid: Grid,
}

/// Collect up to `max_results` snapshots from the `max_lookback_days` days
/// before `exclude`, newest first
pub fn recent<S: KeyValueStore>(
    snapshots: &SnapshotStore<S>,
    exclude: DateKey,
    max_lookback_days: u32,
    max_results: usize,
) -> Vec<HistoryEntry> {
    let mut entries = Vec::with_capacity(max_results.min(max_lookback_days as usize));

    for offset in 1..=max_lookback_days {
        if entries.len() >= max_results {
            break;
        }
        let Some(date) = exclude.minus_days(offset) else {
            break;
        };
        if let Some(grid) = snapshots.load(date) {
            entries.push(HistoryEntry { date, grid });
        }
    }

    log::debug!(
        "History before {}: {} entries within {} days",
        exclude,
        entries.len(),
        max_lookback_days
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use std::cell::RefCell;

    fn day(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn patch(v: u8) -> Grid {
        let mut grid = Grid::new();
        grid.set(0, 0, v);
        grid
    }

    /// Memory store that records every key read
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: RefCell<Vec<String>>,
    }

    impl KeyValueStore for CountingStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.reads.borrow_mut().push(key.to_string());
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_skips_gaps_newest_first() {
        let today = day("2026-10-16");
        let mut snapshots = SnapshotStore::new(CountingStore::default());
        snapshots.save(day("2026-10-15"), &patch(1));
        snapshots.save(day("2026-10-13"), &patch(2));
        // Today and out-of-window days never show up
        snapshots.save(today, &patch(3));
        snapshots.save(day("2026-10-05"), &patch(3));

        let entries = recent(&snapshots, today, 10, 5);
        let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day("2026-10-15"), day("2026-10-13")]);
        assert_eq!(entries[0].grid, patch(1));
        assert_eq!(entries[1].grid, patch(2));

        // The whole window was scanned, nothing beyond it
        let reads = snapshots.store().reads.borrow();
        assert_eq!(reads.len(), 10);
        assert_eq!(reads.first().map(String::as_str), Some("patch-pattern:2026-10-15"));
        assert_eq!(reads.last().map(String::as_str), Some("patch-pattern:2026-10-06"));
    }

    #[test]
    fn test_stops_at_max_results() {
        let today = day("2026-10-16");
        let mut snapshots = SnapshotStore::new(CountingStore::default());
        for offset in 1..=8 {
            snapshots.save(today.minus_days(offset).unwrap(), &patch(1));
        }

        let entries = recent(&snapshots, today, 10, 5);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].date, day("2026-10-15"));
        assert_eq!(entries[4].date, day("2026-10-11"));
        assert_eq!(snapshots.store().reads.borrow().len(), 5);
    }

    #[test]
    fn test_empty_store() {
        let snapshots = SnapshotStore::new(MemoryStore::new());
        assert!(recent(&snapshots, day("2026-10-16"), 10, 5).is_empty());
    }

    #[test]
    fn test_zero_bounds() {
        let today = day("2026-10-16");
        let mut snapshots = SnapshotStore::new(MemoryStore::new());
        snapshots.save(today.minus_days(1).unwrap(), &patch(1));
        assert!(recent(&snapshots, today, 0, 5).is_empty());
        assert!(recent(&snapshots, today, 10, 0).is_empty());
    }

    #[test]
    fn test_malformed_days_are_gaps() {
        let today = day("2026-10-16");
        let mut snapshots = SnapshotStore::new(MemoryStore::new());
        let bad_key = snapshots.storage_key(today.minus_days(1).unwrap());
        snapshots.store_mut().set_item(&bad_key, "[1,2,3]").unwrap();
        snapshots.save(today.minus_days(2).unwrap(), &patch(2));

        let entries = recent(&snapshots, today, 10, 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, today.minus_days(2).unwrap());
    }

    #[test]
    fn test_walk_ends_at_calendar_start() {
        let first = DateKey::new(chrono::NaiveDate::MIN);
        let today = DateKey::new(
            chrono::NaiveDate::MIN
                .checked_add_days(chrono::Days::new(2))
                .unwrap(),
        );
        let mut snapshots = SnapshotStore::new(CountingStore::default());
        snapshots.save(first, &patch(1));

        let entries = recent(&snapshots, today, 10, 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, first);
        // Only the two days that exist were read
        assert_eq!(snapshots.store().reads.borrow().len(), 2);
    }

    #[test]
    fn test_crosses_month_boundary() {
        let today = day("2026-11-02");
        let mut snapshots = SnapshotStore::new(MemoryStore::new());
        snapshots.save(day("2026-10-30"), &patch(3));
        let entries = recent(&snapshots, today, 10, 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, day("2026-10-30"));
    }
}
