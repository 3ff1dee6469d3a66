//! Task use-cases and the task listing.
//!
//! # Responsibility
//! - Guard task writes with the permission predicates.
//! - Run the one-way completion transition as a compare-and-set.
//! - Assemble listing pages: preferences, order, filter, search, pages.
//!
//! # Invariants
//! - A completed task is never rewritten; a second completion attempt
//!   surfaces as `AlreadyCompleted` whether it loses in memory or in the
//!   store.
//! - Listing counts cover the whole project, before filter and search.

use crate::listing::{
    filter_by_status, paginate, resolve_preferences, search_tasks, Page, PreferenceParams,
    SessionPreferences, TaskCounts, ViewPreferences, TASKS_PAGE_SIZE,
};
use crate::model::now_epoch_ms;
use crate::model::project::{Project, ProjectId};
use crate::model::task::{validate_task_title, Task, TaskId, TaskTransitionError};
use crate::model::user::{Principal, UserId};
use crate::permission::{
    can_assign_task, can_edit_task, can_manage_project, can_toggle_task, can_view_project,
    is_project_owner,
};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_repo::{TaskRecord, TaskRepository};
use crate::service::error::ServiceError;
use crate::service::{denied, require_user};
use log::{debug, info, warn};

/// Raw listing request values, exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskListRequest<'a> {
    pub status: Option<&'a str>,
    pub order: Option<&'a str>,
    pub search: Option<&'a str>,
    pub page: Option<&'a str>,
}

/// One rendered listing page with its context.
#[derive(Debug, Clone)]
pub struct TaskListing {
    pub project: Project,
    pub page: Page<TaskRecord>,
    pub counts: TaskCounts,
    pub preferences: ViewPreferences,
    /// Trimmed search term; empty when no search was applied.
    pub search: String,
}

pub struct TaskService<P: ProjectRepository, T: TaskRepository> {
    projects: P,
    tasks: T,
}

impl<P: ProjectRepository, T: TaskRepository> TaskService<P, T> {
    pub fn new(projects: P, tasks: T) -> Self {
        Self { projects, tasks }
    }

    /// Adds a pending, unassigned task. Owner or member only.
    pub fn create_task(
        &self,
        principal: Principal,
        project_id: ProjectId,
        title: impl Into<String>,
    ) -> Result<Task, ServiceError> {
        let actor = require_user(principal, "task_create")?;
        let project = self.load_project(project_id)?;
        if !can_view_project(actor, &project) {
            return Err(denied("task_create", actor, project_id));
        }
        let task = Task::new(project_id, title);
        task.validate()?;

        let task_id = self.tasks.create_task(&task)?;
        info!("event=task_create module=service status=ok task_id={task_id} project_id={project_id} actor_id={actor}");
        self.tasks
            .get_task(task_id)?
            .ok_or(ServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Replaces the title. Owner or assignee only.
    pub fn edit_task(
        &self,
        principal: Principal,
        task_id: TaskId,
        title: impl Into<String>,
    ) -> Result<Task, ServiceError> {
        let actor = require_user(principal, "task_edit")?;
        let (project, mut task) = self.load_task(task_id)?;
        if !can_edit_task(actor, &project, &task) {
            return Err(denied("task_edit", actor, task_id));
        }
        task.rename(title);
        validate_task_title(&task.title)?;

        self.tasks.update_title(task_id, &task.title)?;
        info!("event=task_edit module=service status=ok task_id={task_id} actor_id={actor}");
        Ok(task)
    }

    /// Completes a pending task, recording the caller and the time.
    /// Owner or assignee only.
    pub fn complete_task(&self, principal: Principal, task_id: TaskId) -> Result<Task, ServiceError> {
        let actor = require_user(principal, "task_complete")?;
        let (project, mut task) = self.load_task(task_id)?;
        if !can_toggle_task(actor, &project, &task) {
            return Err(denied("task_complete", actor, task_id));
        }

        let at = now_epoch_ms();
        task.complete(actor, at).map_err(|err| already_completed(err, actor))?;
        if !self.tasks.mark_completed(task_id, actor, at)? {
            warn!("event=task_complete module=service status=conflict task_id={task_id} actor_id={actor} stage=store");
            return Err(ServiceError::AlreadyCompleted(task_id));
        }

        info!("event=task_complete module=service status=ok task_id={task_id} actor_id={actor}");
        Ok(task)
    }

    /// Sets or clears the assignee. Owner only; a new assignee must be a
    /// member of the task's project.
    pub fn assign_task(
        &self,
        principal: Principal,
        task_id: TaskId,
        assignee: Option<UserId>,
    ) -> Result<Task, ServiceError> {
        let actor = require_user(principal, "task_assign")?;
        let (project, mut task) = self.load_task(task_id)?;
        if !is_project_owner(actor, &project) {
            return Err(denied("task_assign", actor, task_id));
        }
        if let Some(assignee) = assignee {
            if !can_assign_task(actor, &project, &task, assignee) {
                warn!("event=task_assign module=service status=invalid task_id={task_id} assignee_id={assignee}");
                return Err(ServiceError::AssigneeNotMember {
                    task: task_id,
                    assignee,
                });
            }
        }

        self.tasks.set_assignee(task_id, assignee)?;
        task.assigned_to = assignee;
        info!(
            "event=task_assign module=service status=ok task_id={task_id} actor_id={actor} assigned={}",
            assignee.is_some()
        );
        Ok(task)
    }

    /// Owner only.
    pub fn delete_task(&self, principal: Principal, task_id: TaskId) -> Result<(), ServiceError> {
        let actor = require_user(principal, "task_delete")?;
        let (project, _) = self.load_task(task_id)?;
        if !can_manage_project(actor, &project) {
            return Err(denied("task_delete", actor, task_id));
        }

        self.tasks.delete_task(task_id)?;
        info!("event=task_delete module=service status=ok task_id={task_id} actor_id={actor}");
        Ok(())
    }

    /// Builds one listing page for a project. Owner or member only.
    ///
    /// Valid `status`/`order` values are remembered in `session` and reused
    /// by later requests that omit them.
    pub fn list_tasks(
        &self,
        principal: Principal,
        project_id: ProjectId,
        request: &TaskListRequest<'_>,
        session: &mut SessionPreferences,
    ) -> Result<TaskListing, ServiceError> {
        let actor = require_user(principal, "task_list")?;
        let project = self.load_project(project_id)?;
        if !can_view_project(actor, &project) {
            return Err(denied("task_list", actor, project_id));
        }

        let params = PreferenceParams {
            status: request.status,
            order: request.order,
        };
        let preferences = resolve_preferences(&params, session);
        let ordered = self
            .tasks
            .list_project_tasks(project_id, preferences.order.direction())?;
        let counts = TaskCounts::tally(&ordered);

        let search = request.search.unwrap_or_default().trim().to_string();
        let visible = search_tasks(filter_by_status(ordered, preferences.status), &search);
        let page = paginate(visible, TASKS_PAGE_SIZE, request.page);
        debug!(
            "event=task_list module=service status=ok project_id={project_id} filter={} order={} page={} matched={}",
            preferences.status.as_str(),
            preferences.order.as_str(),
            page.number,
            page.total_items
        );

        Ok(TaskListing {
            project,
            page,
            counts,
            preferences,
            search,
        })
    }

    fn load_project(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        self.projects
            .get_project(project_id)?
            .ok_or(ServiceError::ProjectNotFound(project_id))
    }

    /// Loads a task together with its parent project.
    ///
    /// A project that disappears between the two reads was deleted, and its
    /// tasks went with it, so the task is reported as not found.
    fn load_task(&self, task_id: TaskId) -> Result<(Project, Task), ServiceError> {
        let task = self
            .tasks
            .get_task(task_id)?
            .ok_or(ServiceError::TaskNotFound(task_id))?;
        let project = self
            .projects
            .get_project(task.project_id)?
            .ok_or(ServiceError::TaskNotFound(task_id))?;
        Ok((project, task))
    }
}

fn already_completed(err: TaskTransitionError, actor: UserId) -> ServiceError {
    match err {
        TaskTransitionError::AlreadyCompleted(task_id) => {
            warn!("event=task_complete module=service status=conflict task_id={task_id} actor_id={actor} stage=memory");
            ServiceError::AlreadyCompleted(task_id)
        }
    }
}
