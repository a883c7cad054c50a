// SQLite-backed development ledger
//
// World state is a flat key -> blob table; events go to an append-only log.
// One `SqliteStub` is handed out per invocation and carries the caller's
// identity plus the transaction id and timestamp for that invocation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CallerIdentity, LedgerError, LedgerStub};

/// Event row from the event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: String,
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub payload: String,
    pub actor: String,
}

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) a ledger database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger database {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory ledger")?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_ledger(&conn)?;
        Ok(Self { conn })
    }

    /// Stub for a single invocation by `identity`
    pub fn stub(&self, identity: CallerIdentity) -> SqliteStub<'_> {
        SqliteStub {
            conn: &self.conn,
            identity,
            tx_id: uuid::Uuid::new_v4().to_string(),
            tx_time: Utc::now(),
        }
    }

    /// Event log, newest first
    pub fn events(&self) -> Result<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, tx_id, timestamp, channel, payload, actor
             FROM events
             ORDER BY id DESC",
        )?;

        let events = stmt
            .query_map([], |row| {
                let timestamp_str: String = row.get(2)?;

                Ok(StoredEvent {
                    event_id: row.get(0)?,
                    tx_id: row.get(1)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?
                        .with_timezone(&Utc),
                    channel: row.get(3)?,
                    payload: row.get(4)?,
                    actor: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Number of keys in world state
    pub fn key_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM world_state", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_ledger(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS world_state (
            key TEXT PRIMARY KEY NOT NULL,
            value BLOB NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            tx_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            channel TEXT NOT NULL,
            payload TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_tx ON events(tx_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// PER-INVOCATION STUB
// ============================================================================

pub struct SqliteStub<'a> {
    conn: &'a Connection,
    identity: CallerIdentity,
    tx_id: String,
    tx_time: DateTime<Utc>,
}

impl SqliteStub<'_> {
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl LedgerStub for SqliteStub<'_> {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value FROM world_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| LedgerError::ReadFailed(e.to_string()))?;

        match value {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(LedgerError::NotFound(key.to_string())),
        }
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.conn
            .execute(
                "INSERT INTO world_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, self.tx_time.to_rfc3339()],
            )
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn set_event(&mut self, channel: &str, payload: &[u8]) -> Result<(), LedgerError> {
        let actor = self
            .identity
            .attributes
            .get("username")
            .cloned()
            .unwrap_or_default();

        self.conn
            .execute(
                "INSERT INTO events (event_id, tx_id, timestamp, channel, payload, actor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    self.tx_id,
                    self.tx_time.to_rfc3339(),
                    channel,
                    String::from_utf8_lossy(payload).into_owned(),
                    actor,
                ],
            )
            .map_err(|e| LedgerError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn read_cert_attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError> {
        self.identity.lookup(name)
    }

    fn tx_timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.tx_time)
    }
}

// ============================================================================
// TESTS
// ============================================================================
