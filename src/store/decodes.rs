use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::modules::monitor::WatchedDecode;

/// A persisted decode, result kept as its JSON rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDecode {
    pub hash: String,
    pub router: String,
    pub sender: String,
    pub decoded_at: DateTime<Utc>,
    pub result_json: String,
}

#[derive(Debug)]
pub struct DecodeStore {
    conn: Connection,
}

impl DecodeStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    /// Store a decode; a hash seen again replaces the earlier row
    pub fn insert(&self, decode: &WatchedDecode) -> Result<()> {
        let result_json = serde_json::to_string(&decode.result)?;
        self.conn.execute(
            "INSERT INTO decodes(hash, router, sender, decoded_at, result_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(hash) DO UPDATE SET
                router=excluded.router,
                sender=excluded.sender,
                decoded_at=excluded.decoded_at,
                result_json=excluded.result_json",
            params![
                decode.hash,
                decode.to,
                decode.from,
                Utc::now().to_rfc3339(),
                result_json
            ],
        )?;
        Ok(())
    }

    /// Most recent decodes first
    pub fn load_recent(&self, limit: usize) -> Result<Vec<StoredDecode>> {
        let mut stmt = self.conn.prepare(
            "SELECT hash, router, sender, decoded_at, result_json
             FROM decodes ORDER BY decoded_at DESC, rowid DESC LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let decoded_at: String = row.get(3)?;
            out.push(StoredDecode {
                hash: row.get(0)?,
                router: row.get(1)?,
                sender: row.get(2)?,
                decoded_at: DateTime::parse_from_rfc3339(&decoded_at)
                    .with_context(|| format!("bad timestamp {}", decoded_at))?
                    .with_timezone(&Utc),
                result_json: row.get(4)?,
            });
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM decodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS decodes (
                hash        TEXT PRIMARY KEY,
                router      TEXT NOT NULL,
                sender      TEXT NOT NULL,
                decoded_at  TEXT NOT NULL,
                result_json TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}
