//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Stages hand data to each other through these tables and nothing else:
//! the dataset tables written by `generate`, the result sinks written by
//! `quality` and `risk`, and the append-only `run_event` log.

mod dataset;
mod results;

pub use results::{QualityLogRow, RiskLogRow, RiskTagRow};

use crate::{
    error::DqResult,
    event::{EventLogEntry, RunEvent},
    value::{Value, TIMESTAMP_FORMAT},
};
use chrono::NaiveDateTime;
use rusqlite::{
    params,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Connection,
};

pub struct DqStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl DqStore {
    /// Open (or create) the dataset file at `path`.
    pub fn open(path: &str) -> DqResult<Self> {
        let conn = Connection::open(path)?;
        // WAL only applies to real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DqResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection. The schema is left as is until
    /// `migrate` is called, which lets tests shape a broken dataset.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, path: None }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DqResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_dataset.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_results.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> DqResult<()> {
        self.conn.execute(
            "INSERT INTO run_event (run_id, stage, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.stage,
                entry.event_type,
                entry.payload,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    /// Serialize and append one event.
    pub fn record_event(&self, run_id: &str, event: &RunEvent, at: NaiveDateTime) -> DqResult<()> {
        let entry = EventLogEntry {
            id: None,
            run_id: run_id.to_string(),
            stage: event.stage().to_string(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_string(event)?,
            created_at: at.format(TIMESTAMP_FORMAT).to_string(),
        };
        self.append_event(&entry)
    }

    pub fn events(&self, run_id: &str) -> DqResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, stage, event_type, payload, created_at
             FROM run_event WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    stage: row.get(2)?,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Dataset encoding: booleans as 0/1, timestamps and dates as text.
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Number(n) => ToSqlOutput::Owned(SqlValue::Real(*n)),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Timestamp(_) | Value::Date(_) => {
                ToSqlOutput::Owned(SqlValue::Text(self.to_string()))
            }
        })
    }
}
