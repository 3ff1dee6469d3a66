//! Task record and its completion state machine.
//!
//! # Responsibility
//! - Hold the persisted task shape, audit fields included.
//! - Provide the only in-memory transition into the completed state.
//!
//! # Invariants
//! - `is_completed` is true iff `completed_by` and `completed_at` are both set.
//! - Completion is one-way and single-fire; audit fields are never rewritten.
//! - `created_at` is fixed at construction.

use crate::model::now_epoch_ms;
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

pub const TASK_TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub is_completed: bool,
    pub assigned_to: Option<UserId>,
    pub completed_by: Option<UserId>,
    /// Unix epoch milliseconds.
    pub completed_at: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Completion state derived from the audit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Completed { by: UserId, at: i64 },
}

impl Task {
    /// Creates an unsaved, unassigned, pending task.
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into().trim().to_string(),
            is_completed: false,
            assigned_to: None,
            completed_by: None,
            completed_at: None,
            created_at: now_epoch_ms(),
        }
    }

    /// Returns the completion state.
    ///
    /// Only meaningful for a task that passes [`Task::validate`]; a flag
    /// without audit data reads as pending.
    pub fn state(&self) -> TaskState {
        match (self.is_completed, self.completed_by, self.completed_at) {
            (true, Some(by), Some(at)) => TaskState::Completed { by, at },
            _ => TaskState::Pending,
        }
    }

    /// Moves a pending task to completed, recording who and when.
    ///
    /// A completed task is left untouched and reported as
    /// [`TaskTransitionError::AlreadyCompleted`].
    pub fn complete(&mut self, actor: UserId, at: i64) -> Result<(), TaskTransitionError> {
        if self.is_completed {
            return Err(TaskTransitionError::AlreadyCompleted(self.id));
        }
        self.is_completed = true;
        self.completed_by = Some(actor);
        self.completed_at = Some(at);
        Ok(())
    }

    /// Replaces the title; the stored value is trimmed.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into().trim().to_string();
    }

    /// Checks write-time invariants, audit consistency included.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_task_title(&self.title)?;
        let audit_set = self.completed_by.is_some() && self.completed_at.is_some();
        let audit_clear = self.completed_by.is_none() && self.completed_at.is_none();
        if (self.is_completed && !audit_set) || (!self.is_completed && !audit_clear) {
            return Err(TaskValidationError::InconsistentCompletionAudit(self.id));
        }
        Ok(())
    }
}

/// Title rule shared by creation and title edits.
pub fn validate_task_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    if title.chars().count() > TASK_TITLE_MAX_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            max_chars: TASK_TITLE_MAX_CHARS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { max_chars: usize },
    /// `is_completed` disagrees with `completed_by`/`completed_at`.
    InconsistentCompletionAudit(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::TitleTooLong { max_chars } => {
                write!(f, "task title must be at most {max_chars} characters")
            }
            Self::InconsistentCompletionAudit(id) => write!(
                f,
                "task {id} completion flag disagrees with completed_by/completed_at"
            ),
        }
    }
}

impl Error for TaskValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTransitionError {
    AlreadyCompleted(TaskId),
}

impl Display for TaskTransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyCompleted(id) => write!(f, "task {id} is already completed"),
        }
    }
}

impl Error for TaskTransitionError {}
