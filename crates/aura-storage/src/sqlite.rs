//! SQLite-backed partition store

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::partition::{Partition, PartitionStore};
use crate::Result;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl PartitionStore for SqliteStore {
    fn load(&self, partition: Partition) -> Result<Option<Value>> {
        let conn = self.conn.lock();
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM partitions WHERE name = ?1",
                [partition.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(document) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    fn save(&self, partition: Partition, value: &Value) -> Result<()> {
        let document = serde_json::to_string(value)?;
        let updated_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO partitions (name, document, updated_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![partition.as_str(), document, updated_at],
        )?;

        Ok(())
    }
}

impl Clone for SqliteStore {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_partitions_are_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        for partition in Partition::ALL {
            assert!(store.load(partition).unwrap().is_none());
        }
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .save(Partition::Settings, &json!({"dark_mode": true, "homepage": "a"}))
            .unwrap();
        store
            .save(Partition::Settings, &json!({"dark_mode": false}))
            .unwrap();

        let loaded = store.load(Partition::Settings).unwrap().unwrap();
        assert_eq!(loaded, json!({"dark_mode": false}));
    }

    #[test]
    fn test_partitions_are_independent() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.save(Partition::History, &json!([{"url": "https://a"}])).unwrap();
        store.save(Partition::Bookmarks, &json!([])).unwrap();

        assert!(store.load(Partition::History).unwrap().is_some());
        assert_eq!(store.load(Partition::Bookmarks).unwrap().unwrap(), json!([]));
        assert!(store.load(Partition::Downloads).unwrap().is_none());
    }
}
