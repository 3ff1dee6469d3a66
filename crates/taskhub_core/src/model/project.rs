//! Project aggregate: one owner plus a set of members.
//!
//! # Invariants
//! - `owner` is never contained in `members`.
//! - `name` is non-blank and at most [`PROJECT_NAME_MAX_CHARS`] characters.

use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

pub const PROJECT_NAME_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner: UserId,
    /// Non-owner participants, one per membership row.
    pub members: BTreeSet<UserId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Project {
    /// Creates an unsaved project owned by `owner` with no members.
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            owner,
            members: BTreeSet::new(),
            created_at: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        if self.name.chars().count() > PROJECT_NAME_MAX_CHARS {
            return Err(ProjectValidationError::NameTooLong {
                max_chars: PROJECT_NAME_MAX_CHARS,
            });
        }
        if self.members.contains(&self.owner) {
            return Err(ProjectValidationError::OwnerListedAsMember(self.owner));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    EmptyName,
    NameTooLong { max_chars: usize },
    OwnerListedAsMember(UserId),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "project name must not be blank"),
            Self::NameTooLong { max_chars } => {
                write!(f, "project name must be at most {max_chars} characters")
            }
            Self::OwnerListedAsMember(id) => {
                write!(f, "project owner {id} must not also be a member")
            }
        }
    }
}

impl Error for ProjectValidationError {}
