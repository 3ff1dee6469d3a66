//! Status filter, text search and counters over task records.
//!
//! Every stage keeps the incoming order, so sorting done by the store
//! survives filtering.

use crate::listing::preferences::StatusFilter;
use crate::repo::task_repo::TaskRecord;
use serde::Serialize;

/// Keeps the tasks admitted by `status`.
pub fn filter_by_status(tasks: Vec<TaskRecord>, status: StatusFilter) -> Vec<TaskRecord> {
    if status == StatusFilter::All {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|record| status.admits(record.task.is_completed))
        .collect()
}

/// Case-insensitive substring search over title and assignee username.
///
/// A blank query returns `tasks` unchanged.
pub fn search_tasks(tasks: Vec<TaskRecord>, query: &str) -> Vec<TaskRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|record| matches_needle(record, &needle))
        .collect()
}

fn matches_needle(record: &TaskRecord, needle: &str) -> bool {
    record.task.title.to_lowercase().contains(needle)
        || record
            .assignee_username
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}

/// Per-project totals, taken before any filter is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn tally(tasks: &[TaskRecord]) -> Self {
        let completed = tasks.iter().filter(|record| record.task.is_completed).count();
        Self {
            total: tasks.len(),
            pending: tasks.len() - completed,
            completed,
        }
    }
}
