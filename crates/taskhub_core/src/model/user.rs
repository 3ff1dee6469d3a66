//! User identity and request principal.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// Upper bound on username length, in characters.
pub const USERNAME_MAX_CHARS: usize = 150;

/// A registered user. Only `id` matters for authorization; `username` is the
/// display name matched by task search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    /// Creates a user with a fresh id. The username is stored trimmed.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into().trim().to_string(),
        }
    }

    /// Checks write-time invariants.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if self.username.chars().count() > USERNAME_MAX_CHARS {
            return Err(UserValidationError::UsernameTooLong {
                max_chars: USERNAME_MAX_CHARS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max_chars: usize },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be blank"),
            Self::UsernameTooLong { max_chars } => {
                write!(f, "username must be at most {max_chars} characters")
            }
        }
    }
}

impl Error for UserValidationError {}

/// Who is making a request.
///
/// Authentication happens outside the core; callers pass the result in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    User(UserId),
}

impl Principal {
    /// Returns the authenticated user id, if any.
    pub fn user_id(self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }
}

impl From<UserId> for Principal {
    fn from(value: UserId) -> Self {
        Self::User(value)
    }
}

impl From<&User> for Principal {
    fn from(value: &User) -> Self {
        Self::User(value.id)
    }
}
