//! Service error taxonomy.
//!
//! # Invariants
//! - Each variant maps to exactly one [`ErrorKind`].
//! - Forbidden, not-found, conflict and validation outcomes stay distinct
//!   all the way to the caller.

use crate::model::project::{ProjectId, ProjectValidationError};
use crate::model::task::{TaskId, TaskValidationError};
use crate::model::user::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse outcome class for boundary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No authenticated principal; the caller should start a login flow.
    Unauthenticated,
    Forbidden,
    NotFound,
    /// Valid actor, invalid state transition.
    Conflict,
    Validation,
    Storage,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Storage => "storage",
        }
    }

    /// Suggested HTTP status. Unauthenticated maps to a redirect.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Unauthenticated => 302,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Validation => 400,
            Self::Storage => 500,
        }
    }
}

#[derive(Debug)]
pub enum ServiceError {
    Unauthenticated,
    /// Actor failed the permission check guarding `action`.
    Forbidden { action: &'static str },
    UserNotFound(UserId),
    ProjectNotFound(ProjectId),
    TaskNotFound(TaskId),
    AlreadyCompleted(TaskId),
    InvalidProject(ProjectValidationError),
    InvalidTask(TaskValidationError),
    AssigneeNotMember { task: TaskId, assignee: UserId },
    Repo(RepoError),
    /// A write was not visible on read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::UserNotFound(_) | Self::ProjectNotFound(_) | Self::TaskNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyCompleted(_) => ErrorKind::Conflict,
            Self::InvalidProject(_) | Self::InvalidTask(_) | Self::AssigneeNotMember { .. } => {
                ErrorKind::Validation
            }
            Self::Repo(_) | Self::InconsistentState(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::Forbidden { action } => write!(f, "not allowed to {action}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::AlreadyCompleted(id) => write!(f, "task {id} is already completed"),
            Self::InvalidProject(err) => write!(f, "{err}"),
            Self::InvalidTask(err) => write!(f, "{err}"),
            Self::AssigneeNotMember { task, assignee } => write!(
                f,
                "user {assignee} is not a member of the project of task {task}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidProject(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::InvalidProject(err) => Self::InvalidProject(err),
            RepoError::InvalidTask(err) => Self::InvalidTask(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ProjectValidationError> for ServiceError {
    fn from(value: ProjectValidationError) -> Self {
        Self::InvalidProject(value)
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}
