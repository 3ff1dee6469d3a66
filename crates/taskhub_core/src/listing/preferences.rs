//! View preferences for task listing.
//!
//! # Responsibility
//! - Parse raw `status`/`order` request values into closed enums.
//! - Merge request values into the caller's per-session record.
//!
//! # Invariants
//! - Only recognized values are ever written to the session record.
//! - Missing values resolve to `status=pending`, `order=newest`.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which tasks a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    All,
    Completed,
    #[default]
    Pending,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    /// Whether a task with the given completion flag passes this filter.
    pub fn admits(self, is_completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Completed => is_completed,
            Self::Pending => !is_completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownPreferenceValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(UnknownPreferenceValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Listing order by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    #[default]
    Newest,
    Oldest,
}

impl TaskOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    pub fn direction(self) -> SortDirection {
        match self {
            Self::Oldest => SortDirection::Ascending,
            Self::Newest => SortDirection::Descending,
        }
    }
}

impl FromStr for TaskOrder {
    type Err = UnknownPreferenceValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(UnknownPreferenceValue {
                field: "order",
                value: other.to_string(),
            }),
        }
    }
}

/// Sort direction over `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn sql_keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Maps a raw `order` value to a sort direction.
///
/// Only `oldest` sorts ascending; everything else, unknown values included,
/// sorts newest first.
pub fn ordering_key(order: &str) -> SortDirection {
    order
        .parse::<TaskOrder>()
        .map_or(SortDirection::Descending, TaskOrder::direction)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreferenceValue {
    pub field: &'static str,
    pub value: String,
}

impl Display for UnknownPreferenceValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} value `{}`", self.field, self.value)
    }
}

impl Error for UnknownPreferenceValue {}

/// Raw request parameters, exactly as received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceParams<'a> {
    pub status: Option<&'a str>,
    pub order: Option<&'a str>,
}

/// Per-session stored preferences.
///
/// Owned by the caller's session store. Serializes under the `tasks_status`
/// and `tasks_order` keys; unrecognized stored values read back as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(
        rename = "tasks_status",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "recognized_or_none"
    )]
    pub status: Option<StatusFilter>,
    #[serde(
        rename = "tasks_order",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "recognized_or_none"
    )]
    pub order: Option<TaskOrder>,
}

/// Effective preferences for one listing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewPreferences {
    pub status: StatusFilter,
    pub order: TaskOrder,
}

/// Resolves effective preferences, remembering valid request values.
///
/// A recognized request value overwrites the stored one. Invalid or missing
/// values fall back to what is stored, then to the defaults.
pub fn resolve_preferences(
    params: &PreferenceParams<'_>,
    stored: &mut SessionPreferences,
) -> ViewPreferences {
    if let Some(status) = params.status.and_then(|value| value.parse().ok()) {
        stored.status = Some(status);
    }
    if let Some(order) = params.order.and_then(|value| value.parse().ok()) {
        stored.order = Some(order);
    }

    ViewPreferences {
        status: stored.status.unwrap_or_default(),
        order: stored.order.unwrap_or_default(),
    }
}

fn recognized_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}
