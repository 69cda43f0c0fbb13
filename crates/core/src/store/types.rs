//! Storage types and traits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::EnrichedRecord;

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Parent row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub director: String,
    pub year: String,
}

/// Child row to insert, referencing an existing parent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub item_id: i64,
    pub original_score: f64,
    pub weighted_score: f64,
}

impl From<&EnrichedRecord> for NewItem {
    fn from(record: &EnrichedRecord) -> Self {
        Self {
            title: record.title.clone(),
            director: record.director.clone(),
            year: record.year.clone(),
        }
    }
}

impl NewScore {
    pub fn for_record(item_id: i64, record: &EnrichedRecord) -> Self {
        Self {
            item_id,
            original_score: record.score,
            weighted_score: record.weighted_score,
        }
    }
}

/// A persisted item joined with its score row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub year: String,
    pub original_score: f64,
    pub weighted_score: f64,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub items: i64,
    pub scores: i64,
}

/// An open transaction.
///
/// Dropping a unit of work that was neither committed nor rolled back rolls
/// it back.
pub trait UnitOfWork {
    /// Insert a parent row, returning its generated id.
    fn insert_item(&mut self, item: &NewItem) -> Result<i64, StoreError>;

    /// Insert a child row.
    fn insert_score(&mut self, score: &NewScore) -> Result<i64, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Trait for item storage backends.
pub trait ItemStore: Send + Sync {
    /// Create the two tables if they are absent. Idempotent.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Open a unit of work. Holds the store exclusively until released.
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError>;

    /// Persisted items by weighted score descending, then id ascending.
    fn list_items(&self, limit: i64) -> Result<Vec<StoredItem>, StoreError>;

    /// Delete an item and, through the cascade, its score row.
    /// Returns false when no such item exists.
    fn delete_item(&self, id: i64) -> Result<bool, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}
