//! Person document store core.
//! Connection management, document primitives and the person repository.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use db::{connect, DbError, StoreUri};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LogSettings, LoggingError,
};
pub use model::person::{NewPerson, Person, PersonId, PersonValidationError};
pub use repo::person_repo::{
    DeleteSummary, PersonRepository, RepoError, RepoResult, SqlitePersonRepository,
};
pub use service::person_service::PersonService;
pub use store::{Document, Filter, FindOptions, Projection, SortSpec, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
