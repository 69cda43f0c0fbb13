//! All-or-nothing persistence of an enriched batch.

use thiserror::Error;
use tracing::{debug, warn};

use super::{ItemStore, NewItem, NewScore, StoreError};
use crate::record::EnrichedRecord;

/// Why a batch was not committed. Nothing from the batch is visible in the
/// store after any of these.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to ensure schema: {0}")]
    Schema(#[source] StoreError),

    #[error("Failed to begin unit of work: {0}")]
    Begin(#[source] StoreError),

    #[error("Failed to insert record {position}: {source}")]
    Insert {
        /// Zero-based position of the record in the batch.
        position: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to commit: {0}")]
    Commit(#[source] StoreError),
}

/// Write every record as an item row plus a score row inside one unit of
/// work, returning the number of records committed.
///
/// Any failure rolls back the whole batch.
pub fn persist(store: &dyn ItemStore, records: &[EnrichedRecord]) -> Result<usize, PersistError> {
    store.ensure_schema().map_err(PersistError::Schema)?;

    let mut uow = store.begin().map_err(PersistError::Begin)?;

    for (position, record) in records.iter().enumerate() {
        let inserted = uow
            .insert_item(&NewItem::from(record))
            .and_then(|item_id| uow.insert_score(&NewScore::for_record(item_id, record)));

        if let Err(source) = inserted {
            warn!(position, error = %source, "Insert failed, rolling back batch");
            if let Err(e) = uow.rollback() {
                warn!(error = %e, "Rollback failed");
            }
            return Err(PersistError::Insert { position, source });
        }
    }

    uow.commit().map_err(PersistError::Commit)?;
    debug!(records = records.len(), "Batch committed");
    Ok(records.len())
}
