//! Access predicates for projects and tasks.
//!
//! # Responsibility
//! - Answer "may this user do X" from already-loaded records.
//! - Stay total and side-effect free; callers turn `false` into an outcome.
//!
//! # Invariants
//! - Task predicates answer `false` when handed a project other than the
//!   task's own.
//! - The owner is not a member; predicates that accept "owner or member"
//!   check both roles explicitly.

use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::user::UserId;

pub fn is_project_owner(user: UserId, project: &Project) -> bool {
    project.owner == user
}

pub fn is_project_member(user: UserId, project: &Project) -> bool {
    project.members.contains(&user)
}

/// Owner or member: may read the project and add tasks to it.
pub fn can_view_project(user: UserId, project: &Project) -> bool {
    is_project_owner(user, project) || is_project_member(user, project)
}

/// Owner-only project administration: delete project, add members,
/// delete tasks.
pub fn can_manage_project(user: UserId, project: &Project) -> bool {
    is_project_owner(user, project)
}

/// Project owner or the task's assignee.
pub fn can_edit_task(user: UserId, project: &Project, task: &Task) -> bool {
    task.project_id == project.id
        && (is_project_owner(user, project) || task.assigned_to == Some(user))
}

/// Completion uses the same rule as editing.
pub fn can_toggle_task(user: UserId, project: &Project, task: &Task) -> bool {
    can_edit_task(user, project, task)
}

/// Only the owner assigns, and only to a member of the task's project.
pub fn can_assign_task(user: UserId, project: &Project, task: &Task, assignee: UserId) -> bool {
    task.project_id == project.id
        && is_project_owner(user, project)
        && is_project_member(assignee, project)
}

pub fn can_transfer_ownership(current_user: UserId, project: &Project, new_owner: UserId) -> bool {
    is_project_owner(current_user, project) && is_project_member(new_owner, project)
}
