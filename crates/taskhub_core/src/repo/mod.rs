//! Persistence contracts and their SQLite implementations.
//!
//! # Responsibility
//! - One repository trait per aggregate: users, projects, tasks.
//! - Keep SQL and row decoding out of the service layer.
//!
//! # Invariants
//! - Write paths validate records before touching SQL.
//! - Read paths reject rows that break domain invariants (`InvalidData`)
//!   instead of masking them.
//! - Repositories only accept fully migrated connections with foreign keys on.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::project::{ProjectId, ProjectValidationError};
use crate::model::task::{TaskId, TaskValidationError};
use crate::model::user::{UserId, UserValidationError};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod project_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidUser(UserValidationError),
    InvalidProject(ProjectValidationError),
    InvalidTask(TaskValidationError),
    UserNotFound(UserId),
    ProjectNotFound(ProjectId),
    TaskNotFound(TaskId),
    /// Username already taken (case-insensitive).
    DuplicateUsername(String),
    /// User still referenced as `completed_by` on some task.
    UserStillReferenced(UserId),
    /// Connection was not produced by `db::open_*` or is out of date.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    ForeignKeysDisabled,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidUser(err) => write!(f, "{err}"),
            Self::InvalidProject(err) => write!(f, "{err}"),
            Self::InvalidTask(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateUsername(name) => write!(f, "username already taken: `{name}`"),
            Self::UserStillReferenced(id) => {
                write!(f, "user {id} is recorded as completing tasks and cannot be removed")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::ForeignKeysDisabled => write!(f, "repository requires PRAGMA foreign_keys=ON"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidUser(err) => Some(err),
            Self::InvalidProject(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

impl From<ProjectValidationError> for RepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::InvalidProject(value)
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

/// Rejects connections that skipped bootstrap.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = schema_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(RepoError::ForeignKeysDisabled);
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

/// Extended result code of a constraint failure, if `err` is one.
pub(crate) fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation => {
            Some(failure.extended_code)
        }
        _ => None,
    }
}
