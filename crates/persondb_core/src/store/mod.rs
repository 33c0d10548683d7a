//! Collection-scoped document primitives over the embedded store.
//!
//! # Responsibility
//! - Persist schema-flexible JSON documents grouped by collection.
//! - Translate filter/sort/limit into engine queries and apply projections.
//!
//! # Invariants
//! - Every stored document carries a string `id` mirrored in the row key.
//! - Field names reaching SQL text have been checked by `query::check_field`.

use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod collection;
pub mod query;

pub use collection::Collection;
pub use query::{
    FieldUpdate, Filter, FilterValue, FindOptions, Projection, SortDirection, SortSpec,
};

/// Decoded JSON document.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by document primitives.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serialization(serde_json::Error),
    /// Field name rejected before query construction.
    InvalidField(String),
    /// Document submitted without a usable string `id`.
    MissingId,
    /// Insert collided with an existing document id.
    DuplicateId(String),
    /// Stored body is not a JSON object.
    MalformedDocument { id: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidField(field) => write!(f, "invalid document field name `{field}`"),
            Self::MissingId => write!(f, "document has no string `id` field"),
            Self::DuplicateId(id) => write!(f, "document id already exists: {id}"),
            Self::MalformedDocument { id } => {
                write!(f, "stored document `{id}` is not a JSON object")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
