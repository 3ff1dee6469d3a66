//! Project and membership persistence.
//!
//! # Responsibility
//! - Store projects together with their membership rows.
//! - Run the ownership swap as one immediate write transaction.
//! - Read a project row and its membership rows from one snapshot.
//!
//! # Invariants
//! - Membership rows are unique per (project, user); re-adding is a no-op.
//! - The store refuses a membership row for the current owner.
//! - Deleting a project cascades to its memberships and tasks.

use crate::model::project::{Project, ProjectId, ProjectValidationError};
use crate::model::user::UserId;
use crate::repo::{constraint_code, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const PROJECT_SELECT_SQL: &str = "SELECT uuid, name, owner_uuid, created_at FROM projects";

pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    /// Loads one project with its member set.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Projects `user` owns or belongs to, newest first.
    fn list_projects_for_user(&self, user: UserId) -> RepoResult<Vec<Project>>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
    /// Returns `false` when the row already existed.
    fn add_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool>;
    /// Returns `false` when there was no row to remove.
    fn remove_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool>;
    /// Swaps owner `from` for member `to`, demoting `from` to member.
    ///
    /// Returns `false` and writes nothing when `from` is no longer the owner
    /// or `to` is no longer a member.
    fn transfer_ownership(&self, project: ProjectId, from: UserId, to: UserId) -> RepoResult<bool>;
}

pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;

        let project_id = project.id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (uuid, name, owner_uuid, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                project_id.as_str(),
                project.name.as_str(),
                project.owner.to_string(),
                project.created_at,
            ],
        )?;
        for member in &project.members {
            tx.execute(
                "INSERT INTO project_memberships (project_uuid, user_uuid) VALUES (?1, ?2);",
                params![project_id.as_str(), member.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let row = tx
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                read_project_columns,
            )
            .optional()?;

        let project = row.map(|columns| into_project(&tx, columns)).transpose()?;
        tx.commit()?;
        Ok(project)
    }

    fn list_projects_for_user(&self, user: UserId) -> RepoResult<Vec<Project>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let mut stmt = tx.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE owner_uuid = ?1
                OR EXISTS (
                    SELECT 1
                    FROM project_memberships m
                    WHERE m.project_uuid = projects.uuid
                      AND m.user_uuid = ?1
                )
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let rows = stmt
            .query_map([user.to_string()], read_project_columns)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        let projects = rows
            .into_iter()
            .map(|columns| into_project(&tx, columns))
            .collect::<RepoResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(projects)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn add_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO project_memberships (project_uuid, user_uuid)
                 VALUES (?1, ?2);",
                params![project.to_string(), user.to_string()],
            )
            .map_err(|err| match constraint_code(&err) {
                Some(ffi::SQLITE_CONSTRAINT_TRIGGER) => {
                    RepoError::InvalidProject(ProjectValidationError::OwnerListedAsMember(user))
                }
                _ => err.into(),
            })?;
        Ok(changed == 1)
    }

    fn remove_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM project_memberships WHERE project_uuid = ?1 AND user_uuid = ?2;",
            params![project.to_string(), user.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn transfer_ownership(&self, project: ProjectId, from: UserId, to: UserId) -> RepoResult<bool> {
        let project_id = project.to_string();
        let old_owner = from.to_string();
        let new_owner = to.to_string();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let swapped = tx.execute(
            "UPDATE projects
             SET owner_uuid = ?3
             WHERE uuid = ?1
               AND owner_uuid = ?2
               AND EXISTS (
                    SELECT 1
                    FROM project_memberships
                    WHERE project_uuid = ?1
                      AND user_uuid = ?3
               );",
            params![project_id.as_str(), old_owner.as_str(), new_owner.as_str()],
        )?;
        if swapped == 0 {
            // Dropping `tx` rolls back.
            return Ok(false);
        }

        tx.execute(
            "DELETE FROM project_memberships WHERE project_uuid = ?1 AND user_uuid = ?2;",
            params![project_id.as_str(), new_owner.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO project_memberships (project_uuid, user_uuid)
             VALUES (?1, ?2);",
            params![project_id.as_str(), old_owner.as_str()],
        )?;
        tx.commit()?;

        Ok(true)
    }
}

type ProjectColumns = (String, String, String, i64);

fn read_project_columns(row: &Row<'_>) -> rusqlite::Result<ProjectColumns> {
    Ok((
        row.get("uuid")?,
        row.get("name")?,
        row.get("owner_uuid")?,
        row.get("created_at")?,
    ))
}

fn into_project(
    conn: &Connection,
    (uuid_text, name, owner_text, created_at): ProjectColumns,
) -> RepoResult<Project> {
    let project = Project {
        id: parse_uuid(&uuid_text, "projects.uuid")?,
        name,
        owner: parse_uuid(&owner_text, "projects.owner_uuid")?,
        members: load_members(conn, &uuid_text)?,
        created_at,
    };
    project
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("project {uuid_text}: {err}")))?;
    Ok(project)
}

fn load_members(conn: &Connection, project_uuid: &str) -> RepoResult<BTreeSet<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_uuid FROM project_memberships WHERE project_uuid = ?1;",
    )?;
    let mut rows = stmt.query([project_uuid])?;
    let mut members = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        members.insert(parse_uuid(&value, "project_memberships.user_uuid")?);
    }
    Ok(members)
}
