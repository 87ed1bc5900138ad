#![forbid(unsafe_code)]
//! SQLite persistence for the stockroom service.
//!
//! All functions are synchronous and take a borrowed `rusqlite::Connection`;
//! the server owns the connection and serializes access. Timestamps are
//! stored as RFC 3339 text (which sorts chronologically), ids as UUID text.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use uuid::Uuid;

pub mod categories;
pub mod dashboard;
pub mod inventory;
pub mod products;
mod schema;
pub mod transactions;
pub mod users;
pub mod warehouses;

pub use transactions::{post_transaction, Posting};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// The addressed row does not exist.
    NotFound(&'static str),
    /// A referenced row (foreign key on a write) does not exist.
    MissingReference(&'static str),
    /// A uniqueness rule would be violated.
    Conflict(String),
    InsufficientStock {
        available: i64,
        requested: i64,
    },
    InvalidPosting(String),
    Sqlite(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::MissingReference(what) => write!(f, "invalid {what} reference"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::InsufficientStock {
                available,
                requested,
            } => write!(
                f,
                "insufficient inventory quantity: {available} available, {requested} requested"
            ),
            Self::InvalidPosting(message) => write!(f, "{message}"),
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Opens (creating if needed) the database file and bootstraps the schema.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    schema::bootstrap(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::bootstrap(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub(crate) fn encode_ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn encode_opt_ts(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.as_ref().map(encode_ts)
}

pub(crate) fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

pub(crate) fn opt_ts_from_sql(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| ts_from_sql(idx, &s)).transpose()
}

pub(crate) fn uuid_from_sql(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    raw.parse::<Uuid>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn opt_uuid_from_sql(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<Uuid>> {
    raw.map(|s| uuid_from_sql(idx, &s)).transpose()
}

/// Tags are persisted as a JSON array of strings.
pub(crate) fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_tags(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Fixture timestamp with the same millisecond precision the storage keeps,
/// so round-tripped rows compare equal.
#[cfg(test)]
pub(crate) fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_default()
}
