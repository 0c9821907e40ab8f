use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};

use crate::types::TableId;

/// Live view of the rows scanned so far, keyed by the string form of the [`TableId`].
///
/// Cloning the view does not copy the data: every clone observes later writes to the registry.
/// Iterating while writers are active is safe but not a consistent snapshot across entries, one
/// table may be read before an update and the next after it.
#[derive(Debug, Clone, Default)]
pub struct RowsScanned {
    inner: Arc<DashMap<String, u64>>,
}

impl RowsScanned {
    pub fn get(&self, table_id: &str) -> Option<u64> {
        self.inner.get(table_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over owned `(table, rows)` pairs.
    ///
    /// Writers to the shard being visited wait until the iterator moves past it, so do not hold
    /// the iterator across an await point or a call back into the tracker.
    pub fn iter(&self) -> impl Iterator<Item = (String, u64)> + '_ {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
    }

    /// Copies the current entries into a map. May be torn across entries.
    pub fn to_map(&self) -> HashMap<String, u64> {
        self.iter().collect()
    }

    fn insert(&self, table_id: String, rows: u64) {
        self.inner.insert(table_id, rows);
    }
}

/// Per-table progress of the snapshot phase.
///
/// Rows scanned and "remaining" membership are two independent projections. A table's final row
/// count is always written before it leaves the remaining set, so a reader never sees a table as
/// done without its final count, while the opposite (final count visible, still remaining) can be
/// observed for a short time.
#[derive(Debug, Default)]
pub struct TableProgressRegistry {
    total_table_count: AtomicUsize,
    remaining_tables: DashSet<String>,
    monitored_tables: DashSet<String>,
    rows_scanned: RowsScanned,
}

impl TableProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the tables selected for the snapshot.
    ///
    /// Meant to be called once per run before any table completes. A second call redefines the
    /// total but adds to the remaining and monitored sets instead of replacing them, and keeps the
    /// rows scanned so far.
    pub fn set_monitored_tables(&self, table_ids: &HashSet<TableId>) {
        self.total_table_count
            .store(table_ids.len(), Ordering::SeqCst);

        for table_id in table_ids {
            let key = table_id.to_string();
            self.remaining_tables.insert(key.clone());
            self.monitored_tables.insert(key);
        }
    }

    /// Records the final row count of `table_id` and removes it from the remaining tables.
    ///
    /// Completing the same table twice overwrites the row count and leaves the remaining tables
    /// untouched the second time.
    pub fn complete_table(&self, table_id: &TableId, rows_scanned: u64) {
        let key = table_id.to_string();
        self.rows_scanned.insert(key.clone(), rows_scanned);
        self.remaining_tables.remove(&key);
    }

    /// Updates the row count of `table_id` without touching the remaining tables.
    pub fn set_rows_scanned(&self, table_id: &TableId, rows_scanned: u64) {
        self.rows_scanned.insert(table_id.to_string(), rows_scanned);
    }

    pub fn total_table_count(&self) -> usize {
        self.total_table_count.load(Ordering::SeqCst)
    }

    pub fn remaining_table_count(&self) -> usize {
        self.remaining_tables.len()
    }

    /// Returns a copy of the monitored tables in no particular order.
    pub fn monitored_tables(&self) -> Vec<String> {
        self.monitored_tables
            .iter()
            .map(|table| table.key().clone())
            .collect()
    }

    pub fn rows_scanned(&self) -> RowsScanned {
        self.rows_scanned.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(names: &[&str]) -> HashSet<TableId> {
        names
            .iter()
            .map(|name| TableId::new("public", *name))
            .collect()
    }

    #[test]
    fn test_empty_registry_reads_defaults() {
        let registry = TableProgressRegistry::new();

        assert_eq!(registry.total_table_count(), 0);
        assert_eq!(registry.remaining_table_count(), 0);
        assert!(registry.monitored_tables().is_empty());
        assert!(registry.rows_scanned().is_empty());
    }

    #[test]
    fn test_completing_subset_leaves_the_rest_remaining() {
        let registry = TableProgressRegistry::new();
        registry.set_monitored_tables(&tables(&["a", "b", "c", "d"]));

        registry.complete_table(&TableId::new("public", "a"), 10);
        registry.complete_table(&TableId::new("public", "c"), 30);

        assert_eq!(registry.total_table_count(), 4);
        assert_eq!(registry.remaining_table_count(), 2);
    }

    #[test]
    fn test_complete_table_is_idempotent() {
        let registry = TableProgressRegistry::new();
        registry.set_monitored_tables(&tables(&["a", "b"]));
        let table_id = TableId::new("public", "a");

        registry.complete_table(&table_id, 100);
        assert_eq!(registry.remaining_table_count(), 1);

        registry.complete_table(&table_id, 120);
        assert_eq!(registry.remaining_table_count(), 1);
        assert_eq!(registry.rows_scanned().get("public.a"), Some(120));
    }

    #[test]
    fn test_rows_scanned_does_not_complete_table() {
        let registry = TableProgressRegistry::new();
        registry.set_monitored_tables(&tables(&["a"]));

        registry.set_rows_scanned(&TableId::new("public", "a"), 50);
        registry.set_rows_scanned(&TableId::new("public", "a"), 70);

        assert_eq!(registry.remaining_table_count(), 1);
        assert_eq!(registry.rows_scanned().get("public.a"), Some(70));
    }

    #[test]
    fn test_rows_scanned_view_is_live() {
        let registry = TableProgressRegistry::new();
        let view = registry.rows_scanned();

        registry.set_rows_scanned(&TableId::new("public", "a"), 5);

        assert_eq!(view.get("public.a"), Some(5));
        assert_eq!(view.to_map(), HashMap::from([("public.a".to_string(), 5)]));
    }

    #[test]
    fn test_complete_unknown_table_is_tolerated() {
        let registry = TableProgressRegistry::new();

        registry.complete_table(&TableId::new("public", "ghost"), 3);

        assert_eq!(registry.remaining_table_count(), 0);
        assert_eq!(registry.rows_scanned().get("public.ghost"), Some(3));
    }

    #[test]
    fn test_second_set_monitored_tables_is_additive() {
        let registry = TableProgressRegistry::new();
        registry.set_monitored_tables(&tables(&["a", "b"]));
        registry.complete_table(&TableId::new("public", "a"), 1);

        registry.set_monitored_tables(&tables(&["c"]));

        assert_eq!(registry.total_table_count(), 1);
        assert_eq!(registry.remaining_table_count(), 2);
        assert_eq!(registry.monitored_tables().len(), 3);
        assert_eq!(registry.rows_scanned().get("public.a"), Some(1));
    }
}
