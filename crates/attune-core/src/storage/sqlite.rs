//! SQLite WAL storage provider
//!
//! One database file holds every user's profile and long-term entries.
//! WAL mode keeps concurrent readers non-blocking while writes serialize
//! through a single connection guarded by a mutex. Rows carry the full
//! record as JSON; columns exist only where queries need them.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::{AttuneError, Result, ResultExt};
use crate::memory::MemoryEntry;
use crate::storage::Storage;
use crate::tone::ToneProfile;

/// Durable storage backed by a single SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` in WAL mode and run
    /// idempotent migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(AttuneError::from)
                .with_context(|| format!("creating database directory '{}'", parent.display()))?;
        }

        let conn = Connection::open(path)
            .map_err(AttuneError::from)
            .with_context(|| format!("opening database '{}'", path.display()))?;

        // WAL: concurrent readers, serialized writers.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(AttuneError::from)
        .context("configuring sqlite pragmas")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        info!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// An in-memory database, handy for tests that still want SQL semantics
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(AttuneError::from)
            .context("opening in-memory database")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                user_id       TEXT PRIMARY KEY,
                payload_json  TEXT NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS memory_entries (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL,
                context       TEXT NOT NULL,
                size_bytes    INTEGER NOT NULL,
                payload_json  TEXT NOT NULL,
                reinforced_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_user
                ON memory_entries(user_id, reinforced_ms DESC);
            ",
        )
        .map_err(AttuneError::from)
        .context("running migrations")?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AttuneError::StorageUnavailable("sqlite connection poisoned".into()))
    }
}

impl Storage for SqliteStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<ToneProfile>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_profile(&self, profile: &ToneProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO profiles (user_id, payload_json, updated_at_ms)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 payload_json = excluded.payload_json,
                 updated_at_ms = excluded.updated_at_ms",
            params![
                profile.user_id,
                json,
                profile.updated_at.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    fn delete_profile(&self, user_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM profiles WHERE user_id = ?1", params![user_id])?;
        Ok(removed > 0)
    }

    fn load_entries(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT payload_json FROM memory_entries
             WHERE user_id = ?1
             ORDER BY reinforced_ms DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

        let mut entries = Vec::new();
        for row in rows {
            let json = row?;
            entries.push(serde_json::from_str(&json)?);
        }
        Ok(entries)
    }

    fn save_entries(&self, user_id: &str, entries: &[MemoryEntry]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(AttuneError::from)
            .context("starting entry transaction")?;

        // Full replace keeps the on-disk set identical to the in-memory one,
        // including evictions.
        tx.execute(
            "DELETE FROM memory_entries WHERE user_id = ?1",
            params![user_id],
        )?;
        for entry in entries {
            let json = serde_json::to_string(entry)?;
            tx.execute(
                "INSERT INTO memory_entries
                     (id, user_id, context, size_bytes, payload_json, reinforced_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.id.to_string(),
                    user_id,
                    entry.context.as_str(),
                    entry.size_bytes as i64,
                    json,
                    entry.last_reinforced_at.timestamp_millis()
                ],
            )?;
        }
        tx.commit()
            .map_err(AttuneError::from)
            .context("committing entry transaction")?;
        Ok(())
    }

    fn delete_entries(&self, user_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM memory_entries WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(removed > 0)
    }
}
