//! Point-in-time copy of the record collection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Identified;

/// Snapshot is an immutable, fully built copy of the collection.
///
/// `version` is 0 for the initial empty snapshot and grows by one with every
/// successful refresh; `refreshed_at` is set once a refresh has completed.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<R> {
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
    records: Vec<R>,
}

impl<R> Snapshot<R> {
    /// Creates the initial empty snapshot.
    pub fn empty() -> Self {
        Self {
            version: 0,
            refreshed_at: None,
            records: Vec::new(),
        }
    }

    /// Creates a snapshot for a refresh completed at `refreshed_at`.
    pub fn new(version: u64, records: Vec<R>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            version,
            refreshed_at: Some(refreshed_at),
            records,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Returns the records in the order the data source produced them.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Identified> Snapshot<R> {
    /// Finds a record by its identity.
    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self::empty()
    }
}
