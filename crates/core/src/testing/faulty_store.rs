//! Item store wrapper that injects storage failures.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::store::{
    ItemStore, NewItem, NewScore, SqliteItemStore, StoreError, StoreStats, StoredItem, UnitOfWork,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Fail the N-th item insert (1-based, counted over the store's lifetime).
    ItemInsert(usize),
    Commit,
}

/// In-memory [`SqliteItemStore`] that fails on demand.
///
/// Everything except the injected fault is delegated to the wrapped store,
/// so rollbacks can be checked through [`FaultyStore::inner`].
pub struct FaultyStore {
    inner: SqliteItemStore,
    fault: Fault,
    item_inserts: AtomicUsize,
}

impl FaultyStore {
    /// Fail the `n`-th item insert.
    pub fn fail_on_item_insert(n: usize) -> Self {
        Self::with_fault(Fault::ItemInsert(n))
    }

    /// Fail every commit.
    pub fn fail_on_commit() -> Self {
        Self::with_fault(Fault::Commit)
    }

    fn with_fault(fault: Fault) -> Self {
        Self {
            inner: SqliteItemStore::in_memory().expect("in-memory sqlite store"),
            fault,
            item_inserts: AtomicUsize::new(0),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &SqliteItemStore {
        &self.inner
    }

    /// Item inserts attempted so far.
    pub fn item_inserts(&self) -> usize {
        self.item_inserts.load(Ordering::SeqCst)
    }
}

impl ItemStore for FaultyStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.inner.ensure_schema()
    }

    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError> {
        Ok(Box::new(FaultyUnitOfWork {
            inner: self.inner.begin()?,
            fault: self.fault,
            item_inserts: &self.item_inserts,
        }))
    }

    fn list_items(&self, limit: i64) -> Result<Vec<StoredItem>, StoreError> {
        self.inner.list_items(limit)
    }

    fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.delete_item(id)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        self.inner.stats()
    }
}

struct FaultyUnitOfWork<'a> {
    inner: Box<dyn UnitOfWork + 'a>,
    fault: Fault,
    item_inserts: &'a AtomicUsize,
}

impl UnitOfWork for FaultyUnitOfWork<'_> {
    fn insert_item(&mut self, item: &NewItem) -> Result<i64, StoreError> {
        let attempt = self.item_inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fault == Fault::ItemInsert(attempt) {
            return Err(StoreError::Database(format!(
                "injected failure on item insert {}",
                attempt
            )));
        }
        self.inner.insert_item(item)
    }

    fn insert_score(&mut self, score: &NewScore) -> Result<i64, StoreError> {
        self.inner.insert_score(score)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fault == Fault::Commit {
            self.inner.rollback()?;
            return Err(StoreError::Database("injected commit failure".to_string()));
        }
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}
