//! User persistence.

use crate::model::user::{User, UserId};
use crate::repo::{constraint_code, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Removes the user, their memberships and owned projects; clears their
    /// task assignments.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (uuid, username) VALUES (?1, ?2);",
                params![user.id.to_string(), user.username.as_str()],
            )
            .map_err(|err| match constraint_code(&err) {
                Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                    RepoError::DuplicateUsername(user.username.clone())
                }
                _ => err.into(),
            })?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE uuid = ?1;",
                [id.to_string()],
                read_user_columns,
            )
            .optional()?
            .map(into_user)
            .transpose()
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE username = ?1 COLLATE NOCASE;",
                [username.trim()],
                read_user_columns,
            )
            .optional()?
            .map(into_user)
            .transpose()
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])
            .map_err(|err| match constraint_code(&err) {
                Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => RepoError::UserStillReferenced(id),
                _ => err.into(),
            })?;

        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }
}

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get("uuid")?, row.get("username")?))
}

fn into_user((uuid_text, username): (String, String)) -> RepoResult<User> {
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        username,
    })
}
