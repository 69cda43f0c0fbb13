//! Durable storage for harvested items.
//!
//! Every item is one parent row in `items` plus one child row in
//! `item_scores`. Writes go through a [`UnitOfWork`] so a batch is committed
//! or discarded as a whole.

mod persist;
mod sqlite;
mod types;

pub use persist::{persist, PersistError};
pub use sqlite::SqliteItemStore;
pub use types::{ItemStore, NewItem, NewScore, StoreError, StoreStats, StoredItem, UnitOfWork};
