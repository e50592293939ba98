//! Reminder store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable keyed storage over the canonical `reminders` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save` is an upsert keyed by `id` and is committed before it returns.
//! - Individual writes are serialized through one connection mutex.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::reminder::Reminder;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    location,
    latitude,
    longitude
FROM reminders";

pub type StoreResult<T> = Result<T, StoreError>;

/// Local storage fault. Never retried by the core.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("reminder id must not be blank")]
    BlankId,
    #[error("invalid persisted reminder data: {0}")]
    InvalidData(String),
    #[error("reminder store connection lock is poisoned")]
    Poisoned,
    #[error("reminder store worker failed: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable keyed storage for reminder records.
///
/// Implementations block the calling thread; async callers go through
/// `ReminderRepository`, which moves calls onto the blocking pool.
pub trait ReminderStore: Send + Sync {
    /// Inserts or fully replaces the record with the same id.
    fn save(&self, reminder: &Reminder) -> StoreResult<()>;
    /// Returns a snapshot of every stored reminder, in no particular order.
    fn get_all(&self) -> StoreResult<Vec<Reminder>>;
    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>>;
    /// Removes every record. Irreversible.
    fn delete_all(&self) -> StoreResult<()>;
}

/// SQLite-backed reminder store.
pub struct SqliteReminderStore {
    conn: Mutex<Connection>,
}

impl SqliteReminderStore {
    /// Wraps an already bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ReminderStore for SqliteReminderStore {
    fn save(&self, reminder: &Reminder) -> StoreResult<()> {
        if reminder.id.trim().is_empty() {
            return Err(StoreError::BlankId);
        }

        self.conn()?.execute(
            "INSERT INTO reminders (
                id,
                title,
                description,
                location,
                latitude,
                longitude
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                location = excluded.location,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                reminder.id.as_str(),
                reminder.title.as_deref(),
                reminder.description.as_deref(),
                reminder.location_label.as_deref(),
                reminder.latitude,
                reminder.longitude,
            ],
        )?;

        Ok(())
    }

    fn get_all(&self) -> StoreResult<Vec<Reminder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{REMINDER_SELECT_SQL} ORDER BY created_at, id;"))?;
        let mut rows = stmt.query([])?;
        let mut reminders = Vec::new();

        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }

        Ok(reminders)
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_reminder_row(row)))
            .optional()?;

        row.transpose()
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.conn()?.execute("DELETE FROM reminders;", [])?;
        Ok(())
    }
}

fn parse_reminder_row(row: &Row<'_>) -> StoreResult<Reminder> {
    let id: String = row.get("id")?;
    if id.trim().is_empty() {
        return Err(StoreError::InvalidData(
            "blank id value in reminders.id".to_string(),
        ));
    }

    Ok(Reminder {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        location_label: row.get("location")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
    })
}
