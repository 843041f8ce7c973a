//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for account records.
//! - Surface the storage-layer email uniqueness contract as a semantic
//!   error.
//! - Resolve the owned task graph lazily, on explicit request.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - `created_at` is written once and never appears in UPDATEs.
//! - Deleting a user cascades to tasks and, transitively, subtasks.

use crate::db::DbError;
use crate::model::user::{User, UserId, UserValidationError};
use crate::repo::now_epoch_ms;
use crate::repo::task_repo::{RepoError, SqliteTaskRepository, TaskRepository};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    full_name,
    picture_url,
    google_user_info_json,
    created_at
FROM users";

pub type UserRepoResult<T> = Result<T, UserRepoError>;

/// Errors from user persistence and query operations.
#[derive(Debug)]
pub enum UserRepoError {
    Validation(UserValidationError),
    Db(DbError),
    NotFound(UserId),
    /// UNIQUE(email) violation: another account already owns the address.
    EmailTaken(String),
    /// Failure while persisting or hydrating the owned task graph.
    Tasks(RepoError),
    InvalidData(String),
}

impl Display for UserRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::Tasks(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for UserRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Tasks(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for UserRepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for UserRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for UserRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for account persistence.
pub trait UserRepository {
    /// Persists an account and every owned task (cascade persist).
    /// Returns the account id.
    fn create_user(&self, user: &mut User) -> UserRepoResult<UserId>;
    /// Loads one account by id. The task collection stays unloaded; call
    /// [`UserRepository::hydrate_tasks`] to materialize it.
    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>>;
    /// Loads one account by its unique email.
    fn get_user_by_email(&self, email: &str) -> UserRepoResult<Option<User>>;
    /// Materializes the owned task graph (tasks with their subtasks) onto
    /// the given account, re-establishing back-references.
    fn hydrate_tasks(&self, user: &mut User) -> UserRepoResult<()>;
    /// Updates profile columns. `created_at` is never rewritten.
    fn update_user(&self, user: &User) -> UserRepoResult<()>;
    /// Deletes an account; owned tasks and subtasks go with it (cascade).
    fn delete_user(&self, id: UserId) -> UserRepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &mut User) -> UserRepoResult<UserId> {
        user.validate()?;
        user.touch_created(now_epoch_ms());

        let inserted = self.conn.execute(
            "INSERT INTO users (
                id,
                email,
                full_name,
                picture_url,
                google_user_info_json,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.full_name.as_deref(),
                user.picture_url.as_deref(),
                user.google_user_info_json.as_deref(),
                user.created_at,
            ],
        );

        if let Err(err) = inserted {
            return Err(map_unique_email(err, &user.email));
        }

        let user_id = user.id;
        let task_repo = SqliteTaskRepository::new(self.conn);
        for task in user.tasks_mut() {
            task.user_id = Some(user_id);
            task_repo.create_task(task).map_err(UserRepoError::Tasks)?;
        }

        Ok(user_id)
    }

    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_user_by_email(&self, email: &str) -> UserRepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;

        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn hydrate_tasks(&self, user: &mut User) -> UserRepoResult<()> {
        let tasks = SqliteTaskRepository::new(self.conn)
            .list_tasks_for_user(user.id)
            .map_err(UserRepoError::Tasks)?;
        user.replace_tasks(tasks);
        Ok(())
    }

    fn update_user(&self, user: &User) -> UserRepoResult<()> {
        user.validate()?;

        let updated = self.conn.execute(
            "UPDATE users
             SET
                email = ?1,
                full_name = ?2,
                picture_url = ?3,
                google_user_info_json = ?4
             WHERE id = ?5;",
            params![
                user.email.as_str(),
                user.full_name.as_deref(),
                user.picture_url.as_deref(),
                user.google_user_info_json.as_deref(),
                user.id.to_string(),
            ],
        );

        match updated {
            Ok(0) => Err(UserRepoError::NotFound(user.id)),
            Ok(_) => Ok(()),
            Err(err) => Err(map_unique_email(err, &user.email)),
        }
    }

    fn delete_user(&self, id: UserId) -> UserRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(UserRepoError::NotFound(id));
        }

        Ok(())
    }
}

fn map_unique_email(err: rusqlite::Error, email: &str) -> UserRepoError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
        let email_constraint = message
            .as_deref()
            .map_or(false, |text| text.contains("users.email"));
        if failure.code == ErrorCode::ConstraintViolation && email_constraint {
            return UserRepoError::EmailTaken(email.to_string());
        }
    }
    err.into()
}

fn parse_user_row(row: &Row<'_>) -> UserRepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        UserRepoError::InvalidData(format!("invalid uuid value `{id_text}` in users.id"))
    })?;

    let email: String = row.get("email")?;
    let full_name: Option<String> = row.get("full_name")?;
    let picture_url: Option<String> = row.get("picture_url")?;
    let google_user_info_json: Option<String> = row.get("google_user_info_json")?;

    let mut user = User::new(email, full_name, picture_url, google_user_info_json);
    user.id = id;
    user.created_at = Some(row.get("created_at")?);
    Ok(user)
}
