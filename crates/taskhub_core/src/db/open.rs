//! Connection bootstrap for file and in-memory stores.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections are migrated to the latest schema.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock wait applied when the caller does not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a store file with the default busy timeout.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens (or creates) a store file, waiting up to `busy_timeout` for locks
/// held by other connections.
///
/// # Side effects
/// - Emits `db_open` events with duration and status.
pub fn open_db_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let path = path.as_ref();
    open_logged("file", Some(path.to_path_buf()), busy_timeout, || {
        Connection::open(path)
    })
}

/// Opens a private in-memory store. Used by tests and the smoke CLI.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", None, DEFAULT_BUSY_TIMEOUT, Connection::open_in_memory)
}

fn open_logged<F>(
    mode: &str,
    path: Option<PathBuf>,
    busy_timeout: Duration,
    open: F,
) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = open().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        DbError::Open { path, source: err }
    })?;

    if let Err(err) = bootstrap(&mut conn, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|source| DbError::Configure {
            setting: "foreign_keys",
            source,
        })?;
    conn.busy_timeout(busy_timeout)
        .map_err(|source| DbError::Configure {
            setting: "busy_timeout",
            source,
        })?;
    apply_migrations(conn)?;
    Ok(())
}
