//! Core of a multi-tenant project and task tracker.
//!
//! Callers authenticate users themselves and pass a [`Principal`] into the
//! services; everything from access rules to listing pages lives here.

pub mod config;
pub mod db;
pub mod listing;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_timeout, DbError, DbResult};
pub use listing::{
    highlight_ranges, mark_matches, ordering_key, resolve_preferences, Page, PreferenceParams,
    SessionPreferences, SortDirection, StatusFilter, TaskCounts, TaskOrder, ViewPreferences,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::project::{Project, ProjectId};
pub use model::task::{Task, TaskId, TaskState};
pub use model::user::{Principal, User, UserId};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRecord, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{ErrorKind, ServiceError};
pub use service::project_service::ProjectService;
pub use service::task_service::{TaskListRequest, TaskListing, TaskService};

/// Minimal health-check API for embedding callers.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
