//! Project and membership use-cases.
//!
//! # Responsibility
//! - Create, read, list and delete projects for an authenticated user.
//! - Guard membership changes and ownership transfer.
//!
//! # Invariants
//! - Check order per operation is fixed: authentication, project lookup,
//!   then the remaining lookups and permission checks as documented on
//!   each method.
//! - Transfer is a single atomic swap in the store; a concurrent change
//!   that breaks its precondition turns into `Forbidden`.

use crate::model::project::{Project, ProjectId};
use crate::model::user::{Principal, User, UserId};
use crate::permission::{
    can_manage_project, can_transfer_ownership, can_view_project, is_project_member,
    is_project_owner,
};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::error::ServiceError;
use crate::service::{denied, require_user};
use log::{info, warn};

pub struct ProjectService<P: ProjectRepository, U: UserRepository> {
    projects: P,
    users: U,
}

impl<P: ProjectRepository, U: UserRepository> ProjectService<P, U> {
    pub fn new(projects: P, users: U) -> Self {
        Self { projects, users }
    }

    /// Creates a project owned by the caller, with no members.
    pub fn create_project(
        &self,
        principal: Principal,
        name: impl Into<String>,
    ) -> Result<Project, ServiceError> {
        let actor = require_user(principal, "project_create")?;
        let project = Project::new(name, actor);
        project.validate()?;

        let project_id = self.projects.create_project(&project)?;
        info!("event=project_create module=service status=ok project_id={project_id} actor_id={actor}");
        self.projects
            .get_project(project_id)?
            .ok_or(ServiceError::InconsistentState(
                "created project not found in read-back",
            ))
    }

    /// Owner or member only.
    pub fn get_project(
        &self,
        principal: Principal,
        project_id: ProjectId,
    ) -> Result<Project, ServiceError> {
        let actor = require_user(principal, "project_get")?;
        let project = self.load_project(project_id)?;
        if !can_view_project(actor, &project) {
            return Err(denied("project_get", actor, project_id));
        }
        Ok(project)
    }

    /// Projects the caller owns or belongs to, newest first.
    pub fn list_projects(&self, principal: Principal) -> Result<Vec<Project>, ServiceError> {
        let actor = require_user(principal, "project_list")?;
        Ok(self.projects.list_projects_for_user(actor)?)
    }

    /// Owner only. Cascades to the project's tasks and memberships.
    pub fn delete_project(
        &self,
        principal: Principal,
        project_id: ProjectId,
    ) -> Result<(), ServiceError> {
        let actor = require_user(principal, "project_delete")?;
        let project = self.load_project(project_id)?;
        if !can_manage_project(actor, &project) {
            return Err(denied("project_delete", actor, project_id));
        }

        self.projects.delete_project(project_id)?;
        info!("event=project_delete module=service status=ok project_id={project_id} actor_id={actor}");
        Ok(())
    }

    /// Adds `user_id` as a member. Owner only.
    ///
    /// Checks: project exists, caller owns it, target user exists, target is
    /// not the owner. Returns `false` when the user already was a member.
    pub fn add_member(
        &self,
        principal: Principal,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<bool, ServiceError> {
        let actor = require_user(principal, "member_add")?;
        let project = self.load_project(project_id)?;
        if !can_manage_project(actor, &project) {
            return Err(denied("member_add", actor, project_id));
        }
        let target = self.load_user(user_id)?;
        if is_project_owner(target.id, &project) {
            return Err(denied("member_add", actor, target.id));
        }

        let added = self.projects.add_member(project_id, target.id)?;
        info!(
            "event=member_add module=service status=ok project_id={project_id} user_id={} added={added}",
            target.id
        );
        Ok(added)
    }

    /// Removes `user_id` from the members. Any current member may do this;
    /// the owner holds no membership row and is refused.
    ///
    /// Checks: project exists, caller is a member, target user exists,
    /// target is not the owner. Returns `false` when the target was not a
    /// member.
    pub fn remove_member(
        &self,
        principal: Principal,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<bool, ServiceError> {
        let actor = require_user(principal, "member_remove")?;
        let project = self.load_project(project_id)?;
        if !is_project_member(actor, &project) {
            return Err(denied("member_remove", actor, project_id));
        }
        let target = self.load_user(user_id)?;
        if is_project_owner(target.id, &project) {
            return Err(denied("member_remove", actor, target.id));
        }

        let removed = self.projects.remove_member(project_id, target.id)?;
        info!(
            "event=member_remove module=service status=ok project_id={project_id} user_id={} removed={removed}",
            target.id
        );
        Ok(removed)
    }

    /// Hands the project to an existing member; the previous owner becomes
    /// a member.
    ///
    /// Checks: project exists, new owner exists, caller owns the project
    /// and the new owner is a member.
    pub fn transfer_ownership(
        &self,
        principal: Principal,
        project_id: ProjectId,
        new_owner: UserId,
    ) -> Result<Project, ServiceError> {
        let actor = require_user(principal, "ownership_transfer")?;
        let project = self.load_project(project_id)?;
        let new_owner = self.load_user(new_owner)?;
        if !can_transfer_ownership(actor, &project, new_owner.id) {
            return Err(denied("ownership_transfer", actor, project_id));
        }

        if !self
            .projects
            .transfer_ownership(project_id, actor, new_owner.id)?
        {
            warn!(
                "event=ownership_transfer module=service status=lost_race project_id={project_id} actor_id={actor}"
            );
            return Err(ServiceError::Forbidden {
                action: "ownership_transfer",
            });
        }

        info!(
            "event=ownership_transfer module=service status=ok project_id={project_id} from={actor} to={}",
            new_owner.id
        );
        self.load_project(project_id)
    }

    fn load_project(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        self.projects
            .get_project(project_id)?
            .ok_or(ServiceError::ProjectNotFound(project_id))
    }

    fn load_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .get_user(user_id)?
            .ok_or(ServiceError::UserNotFound(user_id))
    }
}
