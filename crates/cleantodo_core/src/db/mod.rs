//! SQLite storage bootstrap for the task store.
//!
//! # Responsibility
//! - Open and configure SQLite connections for cleantodo core.
//! - Run the schema bootstrap script before any task row is touched.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database stamped by a newer binary is never opened for writes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure surfaced by the task store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Connection was handed to the store without the bootstrap schema.
    MissingTable(&'static str),
    /// Task id does not fit SQLite's signed 64-bit rowid.
    IdOutOfRange(u64),
    /// A persisted row could not be read back into a record.
    InvalidData(String),
    /// Another thread panicked while holding the connection.
    LockPoisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingTable(table) => write!(f, "required table `{table}` does not exist"),
            Self::IdOutOfRange(id) => write!(f, "task id {id} exceeds the sqlite rowid range"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::LockPoisoned => write!(f, "task store connection lock is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
