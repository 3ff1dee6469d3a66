//! Task persistence.
//!
//! # Responsibility
//! - Targeted single-column writes so concurrent edits do not clobber each
//!   other's fields.
//! - Compare-and-set completion write.
//! - Project-scoped listing joined with the assignee username.
//!
//! # Invariants
//! - Completion only ever flips `is_completed` from 0 to 1 together with both
//!   audit fields, in one statement.
//! - Listing order is `created_at` then insertion order, both in the
//!   requested direction.

use crate::listing::SortDirection;
use crate::model::project::ProjectId;
use crate::model::task::{validate_task_title, Task, TaskId};
use crate::model::user::UserId;
use crate::repo::{
    ensure_connection_ready, parse_bool, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    t.uuid AS uuid,
    t.project_uuid AS project_uuid,
    t.title AS title,
    t.is_completed AS is_completed,
    t.assigned_to AS assigned_to,
    t.completed_by AS completed_by,
    t.completed_at AS completed_at,
    t.created_at AS created_at,
    u.username AS assignee_username
FROM tasks t
LEFT JOIN users u ON u.uuid = t.assigned_to";

/// Listing read model: a task plus its assignee's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task: Task,
    pub assignee_username: Option<String>,
}

pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn update_title(&self, id: TaskId, title: &str) -> RepoResult<()>;
    fn set_assignee(&self, id: TaskId, assignee: Option<UserId>) -> RepoResult<()>;
    /// Completes a pending task. Returns `false` if it was already completed.
    fn mark_completed(&self, id: TaskId, by: UserId, at: i64) -> RepoResult<bool>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn list_project_tasks(
        &self,
        project: ProjectId,
        direction: SortDirection,
    ) -> RepoResult<Vec<TaskRecord>>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn task_exists(&self, id: TaskId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                project_uuid,
                title,
                is_completed,
                assigned_to,
                completed_by,
                completed_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.title.as_str(),
                i64::from(task.is_completed),
                task.assigned_to.map(|id| id.to_string()),
                task.completed_by.map(|id| id.to_string()),
                task.completed_at,
                task.created_at,
            ],
        )?;

        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE t.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?.task)),
            None => Ok(None),
        }
    }

    fn update_title(&self, id: TaskId, title: &str) -> RepoResult<()> {
        let title = title.trim();
        validate_task_title(title)?;

        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?2 WHERE uuid = ?1;",
            params![id.to_string(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn set_assignee(&self, id: TaskId, assignee: Option<UserId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET assigned_to = ?2 WHERE uuid = ?1;",
            params![id.to_string(), assignee.map(|user| user.to_string())],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn mark_completed(&self, id: TaskId, by: UserId, at: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                is_completed = 1,
                completed_by = ?2,
                completed_at = ?3
             WHERE uuid = ?1
               AND is_completed = 0;",
            params![id.to_string(), by.to_string(), at],
        )?;
        if changed == 1 {
            return Ok(true);
        }
        if self.task_exists(id)? {
            return Ok(false);
        }
        Err(RepoError::TaskNotFound(id))
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn list_project_tasks(
        &self,
        project: ProjectId,
        direction: SortDirection,
    ) -> RepoResult<Vec<TaskRecord>> {
        let keyword = direction.sql_keyword();
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE t.project_uuid = ?1
             ORDER BY t.created_at {keyword}, t.rowid {keyword};"
        ))?;
        let mut rows = stmt.query([project.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_task_row(row)?);
        }
        Ok(records)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskRecord> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;

    let task = Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        project_id: parse_uuid(&project_text, "tasks.project_uuid")?,
        title: row.get("title")?,
        is_completed: parse_bool(row.get("is_completed")?, "tasks.is_completed")?,
        assigned_to: parse_optional_uuid(row.get("assigned_to")?, "tasks.assigned_to")?,
        completed_by: parse_optional_uuid(row.get("completed_by")?, "tasks.completed_by")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
    };
    task.validate()
        .map_err(|err| RepoError::InvalidData(format!("task {uuid_text}: {err}")))?;

    Ok(TaskRecord {
        task,
        assignee_username: row.get::<_, Option<String>>("assignee_username")?,
    })
}

