//! Task listing pipeline.
//!
//! # Responsibility
//! - Resolve per-session view preferences (status filter, ordering).
//! - Filter, search and paginate a project's tasks.
//! - Locate search hits inside titles for the presentation layer.
//!
//! # Invariants
//! - Status filter and search compose with logical AND.
//! - Request values are validated once here; everything downstream works on
//!   closed enums.

pub mod highlight;
pub mod pagination;
pub mod pipeline;
pub mod preferences;

pub use highlight::{highlight_ranges, mark_matches};
pub use pagination::{paginate, Page, TASKS_PAGE_SIZE};
pub use pipeline::{filter_by_status, search_tasks, TaskCounts};
pub use preferences::{
    ordering_key, resolve_preferences, PreferenceParams, SessionPreferences, SortDirection,
    StatusFilter, TaskOrder, ViewPreferences,
};
