//! SQLite storage bootstrap.
//!
//! # Responsibility
//! - Open and configure connections for the task tracker store.
//! - Run schema migrations before any repository touches the data.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Every connection handed out has `foreign_keys=ON`; cascades and the
//!   membership trigger depend on it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while bringing a task store online.
#[derive(Debug)]
pub enum DbError {
    /// The store file could not be opened or created. `path` is `None` for
    /// in-memory stores.
    Open {
        path: Option<PathBuf>,
        source: rusqlite::Error,
    },
    /// A connection setting the store relies on was refused.
    Configure {
        setting: &'static str,
        source: rusqlite::Error,
    },
    /// A schema step failed; nothing from the pending steps was kept.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The store was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Any other statement failure, e.g. reading the schema version.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open {
                path: Some(path),
                source,
            } => write!(f, "cannot open task store {}: {source}", path.display()),
            Self::Open { path: None, source } => {
                write!(f, "cannot open in-memory task store: {source}")
            }
            Self::Configure { setting, source } => {
                write!(f, "cannot apply {setting} to task store connection: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "task store schema step {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "task store schema version {db_version} is newer than this build supports ({latest_supported})"
            ),
            Self::Sqlite(err) => write!(f, "task store error: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Configure { source, .. }
            | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    fn sqlite_error(message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(message.to_string()),
        )
    }

    #[test]
    fn messages_name_the_failing_stage() {
        let migration = DbError::Migration {
            version: 2,
            source: sqlite_error("no such table: projects"),
        };
        assert!(migration.to_string().starts_with("task store schema step 2 failed"));
        assert!(migration.source().is_some());

        let configure = DbError::Configure {
            setting: "foreign_keys",
            source: sqlite_error("locked"),
        };
        assert!(configure.to_string().contains("foreign_keys"));

        let memory = DbError::Open {
            path: None,
            source: sqlite_error("out of memory"),
        };
        assert!(memory.to_string().starts_with("cannot open in-memory task store"));

        let newer = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert!(newer.source().is_none());
    }
}
