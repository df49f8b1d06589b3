//! SQLite-backed slots: a single `slots` table keyed by slot name.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::{SlotStorage, StoreError};

pub struct SqliteSlots {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSlots {
    /// Open or create the database at the given path
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        create_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"CREATE TABLE IF NOT EXISTS slots (
               key TEXT PRIMARY KEY,
               value TEXT NOT NULL,
               updated_at TEXT NOT NULL
           )"#,
    )?;
    Ok(())
}

#[async_trait]
impl SlotStorage for SqliteSlots {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                              updated_at = excluded.updated_at"#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
