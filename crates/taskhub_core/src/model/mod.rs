//! Domain model for users, projects and tasks.
//!
//! # Responsibility
//! - Define the records the permission and state-transition core reasons about.
//! - Own write-time validation so every persistence path shares one rule set.
//!
//! # Invariants
//! - Identities are stable UUIDs and compared by value only.
//! - A project's owner never appears in its member set.
//! - A task is completed iff both audit fields are set.

pub mod project;
pub mod task;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clamps to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
