//! SQLite-backed item store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::warn;

use super::{ItemStore, NewItem, NewScore, StoreError, StoreStats, StoredItem, UnitOfWork};

/// SQLite-backed item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Open the database file, creating it and the tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                director TEXT NOT NULL,
                year TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS item_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                original_score REAL NOT NULL,
                weighted_score REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_item_scores_item_id ON item_scores(item_id);
            CREATE INDEX IF NOT EXISTS idx_item_scores_weighted ON item_scores(weighted_score DESC);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<StoredItem> {
        Ok(StoredItem {
            id: row.get(0)?,
            title: row.get(1)?,
            director: row.get(2)?,
            year: row.get(3)?,
            original_score: row.get(4)?,
            weighted_score: row.get(5)?,
        })
    }
}

impl ItemStore for SqliteItemStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        Self::initialize_schema(&conn)
    }

    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError> {
        let conn = self.conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Box::new(SqliteUnitOfWork {
            conn,
            finished: false,
        }))
    }

    fn list_items(&self, limit: i64) -> Result<Vec<StoredItem>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT i.id, i.title, i.director, i.year, s.original_score, s.weighted_score \
                 FROM items i JOIN item_scores s ON s.item_id = i.id \
                 ORDER BY s.weighted_score DESC, i.id ASC LIMIT ?",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], Self::row_to_item)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row_result in rows {
            let item = row_result.map_err(|e| StoreError::Database(e.to_string()))?;
            items.push(item);
        }

        Ok(items)
    }

    fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM items WHERE id = ?", params![id])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT (SELECT COUNT(*) FROM items), (SELECT COUNT(*) FROM item_scores)",
            [],
            |row| {
                Ok(StoreStats {
                    items: row.get(0)?,
                    scores: row.get(1)?,
                })
            },
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}

/// Transaction over the store's connection.
///
/// Holds the connection lock for its whole lifetime.
struct SqliteUnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl SqliteUnitOfWork<'_> {
    fn finish(&mut self, statement: &str) -> Result<(), StoreError> {
        self.finished = true;
        self.conn
            .execute_batch(statement)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn insert_item(&mut self, item: &NewItem) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO items (title, director, year) VALUES (?, ?, ?)",
                params![item.title, item.director, item.year],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_score(&mut self, score: &NewScore) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO item_scores (item_id, original_score, weighted_score) VALUES (?, ?, ?)",
                params![score.item_id, score.original_score, score.weighted_score],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        if let Err(e) = self.finish("COMMIT") {
            // A failed COMMIT can leave the transaction open.
            if !self.conn.is_autocommit() {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
            return Err(e);
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteUnitOfWork<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "Failed to roll back abandoned unit of work");
        }
    }
}
