use std::{
    fs,
    path::Path,
    sync::{
        Mutex,
        MutexGuard,
    },
};

use chrono::{
    DateTime,
    Utc,
};
use rusqlite::{
    params,
    Connection,
    OptionalExtension,
};

use crate::core::StudyError;

pub mod bundles;
pub mod words;

/// Cache bookkeeping held in the singleton `wk_cache` row.
#[derive(Debug, Clone)]
pub struct CacheState {
    pub last_refresh: Option<String>,
    pub payload_path: String,
}

/// SQLite-backed store. Every operation takes the connection lock, runs its
/// statements, and releases; no long-lived transaction state.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StudyError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StudyError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock means some other thread panicked mid-operation; the
        // single-statement writes below are atomic either way, so recover.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn cache_state(&self) -> Result<Option<CacheState>, StudyError> {
        let conn = self.conn();
        let state = conn
            .query_row(
                "SELECT last_refresh, payload_path FROM wk_cache WHERE id = 1",
                [],
                |row| {
                    Ok(CacheState {
                        last_refresh: row.get(0)?,
                        payload_path: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    /// Fetch the cache row, creating it empty on first access.
    pub fn ensure_cache_row(&self, default_payload: &Path) -> Result<CacheState, StudyError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO wk_cache (id, last_refresh, payload_path) VALUES (1, NULL, ?1)",
            params![default_payload.to_string_lossy().into_owned()],
        )?;
        let state = conn.query_row(
            "SELECT last_refresh, payload_path FROM wk_cache WHERE id = 1",
            [],
            |row| {
                Ok(CacheState {
                    last_refresh: row.get(0)?,
                    payload_path: row.get(1)?,
                })
            },
        )?;
        Ok(state)
    }

    pub fn mark_cache_refreshed(
        &self,
        at: DateTime<Utc>,
        payload: &Path,
    ) -> Result<(), StudyError> {
        self.conn().execute(
            "UPDATE wk_cache SET last_refresh = ?1, payload_path = ?2 WHERE id = 1",
            params![at.to_rfc3339(), payload.to_string_lossy().into_owned()],
        )?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<(), StudyError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL,
            translation TEXT NOT NULL,
            audio_path TEXT,
            tags TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_words_word ON words(word);

        CREATE TABLE IF NOT EXISTS review_stats (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            total INTEGER NOT NULL DEFAULT 0,
            correct INTEGER NOT NULL DEFAULT 0,
            wrong INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS daily_bundles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            yyyymmdd TEXT NOT NULL UNIQUE,
            word_ids TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wk_cache (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_refresh TEXT,
            payload_path TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn cache_row_created_lazily() {
        let store = Store::open_in_memory().expect("open");
        assert!(store.cache_state().expect("query").is_none());

        let state = store.ensure_cache_row(&PathBuf::from("payload.json")).expect("ensure");
        assert!(state.last_refresh.is_none());
        assert_eq!(state.payload_path, "payload.json");
    }

    #[test]
    fn ensure_cache_row_is_idempotent() {
        let store = Store::open_in_memory().expect("open");
        store.ensure_cache_row(&PathBuf::from("a.json")).expect("first");
        store
            .mark_cache_refreshed(Utc::now(), &PathBuf::from("a.json"))
            .expect("mark");

        // A second ensure must not reset the recorded timestamp
        let state = store.ensure_cache_row(&PathBuf::from("b.json")).expect("second");
        assert!(state.last_refresh.is_some());
        assert_eq!(state.payload_path, "a.json");
    }

    #[test]
    fn mark_refreshed_round_trips_timestamp() {
        let store = Store::open_in_memory().expect("open");
        store.ensure_cache_row(&PathBuf::from("p.json")).expect("ensure");

        let at = Utc::now();
        store.mark_cache_refreshed(at, &PathBuf::from("p.json")).expect("mark");

        let state = store.cache_state().expect("query").expect("row");
        let stored = state.last_refresh.expect("timestamp");
        let parsed = DateTime::parse_from_rfc3339(&stored).expect("rfc3339");
        assert_eq!(parsed.with_timezone(&Utc), at);
    }

    #[test]
    fn opens_on_disk_and_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let db_path = dir.path().join("nested").join("study.db");
        let store = Store::open(&db_path).expect("open");
        store.ensure_cache_row(&PathBuf::from("p.json")).expect("ensure");
        assert!(db_path.exists());
    }
}
