//! Connection bootstrap for the document store.
//!
//! # Responsibility
//! - Open file or in-memory connections and apply pending migrations.
//! - Emit `db_connect` events: "connection successful" or "connection error".
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Failures are logged and also returned; nothing is retried.

use super::migrations::apply_migrations;
use super::{DbResult, StoreUri};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the store named by `uri`.
///
/// This is the single entry point hosts use at startup. The returned
/// connection is owned by the caller; drop it or pass it to [`close_db`]
/// to tear the session down.
///
/// # Errors
/// - Returns `DbError::Sqlite` when the file cannot be opened or configured.
/// - Returns `DbError::UnsupportedSchemaVersion` for stores written by a
///   newer build.
pub fn connect(uri: &StoreUri) -> DbResult<Connection> {
    let opened = match uri {
        StoreUri::Memory => open_db_in_memory(),
        StoreUri::File(path) => open_db(path),
    };
    opened
        .inspect(|_| {
            info!(
                "event=db_connect module=db status=ok mode={} database={} message=\"connection successful\"",
                uri.mode(),
                uri.database_name()
            );
        })
        .inspect_err(|err| {
            error!(
                "event=db_connect module=db status=error mode={} database={} message=\"connection error\" error={}",
                uri.mode(),
                uri.database_name(),
                err
            );
        })
}

/// Opens a file-backed store and applies all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory store and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Liveness probe for an open connection.
pub fn ping(conn: &Connection) -> DbResult<()> {
    conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

/// Closes a connection and surfaces any error SQLite reports on close.
pub fn close_db(conn: Connection) -> DbResult<()> {
    conn.close().map_err(|(_, err)| err)?;
    info!("event=db_close module=db status=ok");
    Ok(())
}

fn open_with(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
