//! Environment-driven configuration.
//!
//! # Responsibility
//! - Read store location and logging settings from the process environment.
//! - Load a `.env` file first when one is present.
//!
//! # Invariants
//! - A missing or malformed store URI is an error, never a silent default.
//! - An explicit URI override replaces only the store location; log
//!   settings still come from the environment.

use crate::db::{DbError, StoreUri};
use crate::logging::default_log_level;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const URI_VAR: &str = "PERSONDB_URI";
pub const LOG_LEVEL_VAR: &str = "PERSONDB_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PERSONDB_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store_uri: StoreUri,
    pub log_level: String,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidUri(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "environment variable `{var}` is not set"),
            Self::InvalidUri(err) => write!(f, "`{URI_VAR}`: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Missing(_) => None,
            Self::InvalidUri(err) => Some(err),
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_uri(None)
    }

    /// Like [`AppConfig::from_env`], with `uri` taking precedence over
    /// `PERSONDB_URI` when given.
    pub fn from_env_with_uri(uri: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars_with_uri(std::env::vars(), uri)
    }

    /// Builds configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::from_vars_with_uri(vars, None)
    }

    pub fn from_vars_with_uri<I>(vars: I, uri: Option<&str>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        if let Some(uri) = uri.filter(|uri| !uri.trim().is_empty()) {
            vars.insert(URI_VAR.to_string(), uri.to_string());
        }

        let raw_uri = vars.get(URI_VAR).ok_or(ConfigError::Missing(URI_VAR))?;
        let store_uri = StoreUri::parse(raw_uri).map_err(ConfigError::InvalidUri)?;

        Ok(Self {
            store_uri,
            log_level: vars
                .get(LOG_LEVEL_VAR)
                .cloned()
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: vars.get(LOG_DIR_VAR).map(PathBuf::from),
        })
    }
}
