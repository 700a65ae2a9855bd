//! SQLite-based local session store.
//!
//! Provides persistent storage for:
//! - Session records, one JSON document per session id
//! - Summary columns for listing without decoding documents
//! - Key-value store for the draft and other application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::gateway::{DraftCache, PersistenceGateway};
use super::{data_dir, migrations};
use crate::error::{CoreError, PersistError};
use crate::ids::SessionId;
use crate::session::SessionRecord;

/// kv key holding the in-progress story.
pub const DRAFT_KEY: &str = "writinglab_draft";

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub word_count: u64,
    pub event_count: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/writinglab/writinglab.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("writinglab.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, PersistError> {
        let conn = Connection::open(path)?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, PersistError> {
        let conn = Connection::open_in_memory()?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Insert or replace the record stored under `record.session_id`.
    ///
    /// # Errors
    /// Returns an error if encoding or the upsert fails.
    pub fn save_session(&self, record: &SessionRecord) -> Result<(), PersistError> {
        let document = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO sessions (id, document, started_at, saved_at, word_count, event_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                saved_at = excluded.saved_at,
                word_count = excluded.word_count,
                event_count = excluded.event_count",
            params![
                record.session_id.as_str(),
                document,
                record.started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                record.final_word_count() as i64,
                record.events.len() as i64,
            ],
        )?;
        Ok(())
    }

    pub fn load_session(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM sessions WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(json) => Ok(Some(SessionRecord::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Stored sessions, most recently started first.
    pub fn list_sessions(&self) -> Result<Vec<StoredSession>, PersistError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, saved_at, word_count, event_count
             FROM sessions
             ORDER BY started_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, started_at, saved_at, word_count, event_count) = row?;
            sessions.push(StoredSession {
                id: SessionId::new(id),
                started_at: parse_timestamp(&started_at)?,
                saved_at: parse_timestamp(&saved_at)?,
                word_count: word_count.max(0) as u64,
                event_count: event_count.max(0) as u64,
            });
        }
        Ok(sessions)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, PersistError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistError::Database(format!("bad timestamp '{value}': {e}")))
}

impl PersistenceGateway for Database {
    fn name(&self) -> &str {
        "local"
    }

    fn save(&self, id: &SessionId, record: &SessionRecord) -> Result<(), PersistError> {
        if *id != record.session_id {
            return Err(PersistError::Database(format!(
                "record for '{}' saved under '{id}'",
                record.session_id
            )));
        }
        self.save_session(record)
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        self.load_session(id)
    }
}

impl DraftCache for Database {
    fn save_draft(&self, text: &str) {
        if let Err(e) = self.kv_set(DRAFT_KEY, text) {
            tracing::warn!(error = %e, "failed to save draft");
        }
    }

    fn load_draft(&self) -> Option<String> {
        self.kv_get(DRAFT_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read draft");
            None
        })
    }

    fn clear_draft(&self) {
        if let Err(e) = self.kv_delete(DRAFT_KEY) {
            tracing::warn!(error = %e, "failed to clear draft");
        }
    }
}
