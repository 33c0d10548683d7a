//! Store URI parsing.

use super::{DbError, DbResult};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MEMORY_URI: &str = "sqlite::memory:";
const FILE_SCHEME: &str = "sqlite://";

/// Location of a document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    /// Private in-memory store, discarded on close.
    Memory,
    /// File-backed store; the file stem names the database.
    File(PathBuf),
}

impl StoreUri {
    /// Parses `sqlite::memory:` or `sqlite://<path>`.
    ///
    /// # Errors
    /// - `DbError::InvalidUri` for any other scheme or an empty path.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let trimmed = raw.trim();
        if trimmed == MEMORY_URI {
            return Ok(Self::Memory);
        }

        match trimmed.strip_prefix(FILE_SCHEME) {
            Some(path) if !path.trim().is_empty() => Ok(Self::File(PathBuf::from(path))),
            _ => Err(DbError::InvalidUri(trimmed.to_string())),
        }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Database name used in connection log lines.
    pub fn database_name(&self) -> String {
        match self {
            Self::Memory => "memory".to_string(),
            Self::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    pub(super) fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

impl Display for StoreUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_URI),
            Self::File(path) => write!(f, "{FILE_SCHEME}{}", path.display()),
        }
    }
}
