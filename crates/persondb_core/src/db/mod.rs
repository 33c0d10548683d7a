//! Connection management for the embedded document store.
//!
//! # Responsibility
//! - Resolve a configured store URI into an open, migrated connection.
//! - Report connection state; own no query logic.
//!
//! # Invariants
//! - Storage layout version is tracked via `PRAGMA user_version`.
//! - Callers never see a connection whose migrations did not finish.
//! - Connection failures are returned to the caller, never swallowed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod uri;

pub use open::{close_db, connect, open_db, open_db_in_memory, ping};
pub use uri::StoreUri;

pub type DbResult<T> = Result<T, DbError>;

/// Connection-level failure: the store could not be reached or prepared.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidUri(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidUri(uri) => write!(
                f,
                "unsupported store uri `{uri}`; expected `sqlite::memory:` or `sqlite://<path>`"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store layout version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidUri(_) | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
