//! Task/subtask repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `tasks` and `subtasks` tables.
//! - Assign surrogate ids on first save and patch them back onto the
//!   in-memory graph, children included.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call model `validate()` before SQL mutations.
//! - `created_at` columns are written once and never appear in UPDATEs.
//! - Subtask collections materialize in ascending `(created_at, id)`
//!   order.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::task::{SubTask, SubTaskId, Task, TaskId, TaskStatus, TaskValidationError};
use crate::model::user::UserId;
use crate::repo::now_epoch_ms;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    description,
    status,
    start_date,
    end_date,
    created_at,
    updated_at
FROM tasks";

const SUBTASK_SELECT_SQL: &str = "SELECT
    id,
    parent_task_id,
    title,
    description,
    status,
    start_date,
    end_date,
    created_at,
    updated_at
FROM subtasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for task/subtask persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    TaskNotFound(TaskId),
    SubTaskNotFound(SubTaskId),
    /// Write requires a storage-assigned id the entity does not have yet.
    NotPersisted(&'static str),
    /// Required owning reference is absent at persistence time.
    MissingOwner(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubTaskNotFound(id) => write!(f, "subtask not found: {id}"),
            Self::NotPersisted(entity) => {
                write!(f, "{entity} has no storage-assigned id yet")
            }
            Self::MissingOwner(entity) => {
                write!(f, "{entity} is missing its required owner reference")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task/subtask persistence.
///
/// `create_*` operations take `&mut` so storage-assigned ids and stamped
/// timestamps land back on the in-memory graph.
pub trait TaskRepository {
    /// Persists a task and every owned subtask. Returns the assigned id.
    fn create_task(&self, task: &mut Task) -> RepoResult<TaskId>;
    /// Loads one task with its subtask collection hydrated.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists a user's tasks in creation order, subtasks hydrated.
    fn list_tasks_for_user(&self, user_id: UserId) -> RepoResult<Vec<Task>>;
    /// Loads the children of one task (deferred collection resolution).
    fn list_subtasks(&self, task_id: TaskId) -> RepoResult<Vec<SubTask>>;
    /// Updates a task's own columns; the collection is left untouched.
    fn update_task(&self, task: &mut Task) -> RepoResult<()>;
    /// Reconciles stored rows with the in-memory collection: new members
    /// are inserted, kept members updated, vanished members deleted.
    fn sync_subtasks(&self, task: &mut Task) -> RepoResult<()>;
    /// Persists one subtask. Returns the assigned id.
    fn create_subtask(&self, subtask: &mut SubTask) -> RepoResult<SubTaskId>;
    /// Updates one subtask's columns.
    fn update_subtask(&self, subtask: &mut SubTask) -> RepoResult<()>;
    /// Deletes one subtask row.
    fn delete_subtask(&self, id: SubTaskId) -> RepoResult<()>;
    /// Deletes a task; owned subtasks go with it (cascade).
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &mut Task) -> RepoResult<TaskId> {
        task.validate()?;
        let user_id = task.user_id.ok_or(RepoError::MissingOwner("task"))?;

        let now = now_epoch_ms();
        task.attrs.touch_created(now);

        self.conn.execute(
            "INSERT INTO tasks (
                user_id,
                title,
                description,
                status,
                start_date,
                end_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user_id.to_string(),
                task.attrs.title.as_str(),
                task.attrs.description.as_deref(),
                task_status_to_db(task.attrs.status),
                task.attrs.start_date,
                task.attrs.end_date,
                task.attrs.created_at,
                task.attrs.updated_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        task.id = Some(id);

        for subtask in task.subtasks_mut() {
            subtask.parent_task_id = Some(id);
            insert_subtask(self.conn, subtask, now)?;
        }

        Ok(id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut task = parse_task_row(row)?;
        for subtask in self.list_subtasks(id)? {
            task.add_subtask(subtask);
        }

        Ok(Some(task))
    }

    fn list_tasks_for_user(&self, user_id: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} WHERE user_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        for task in &mut tasks {
            let Some(task_id) = task.id else { continue };
            for subtask in self.list_subtasks(task_id)? {
                task.add_subtask(subtask);
            }
        }

        Ok(tasks)
    }

    fn list_subtasks(&self, task_id: TaskId) -> RepoResult<Vec<SubTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBTASK_SELECT_SQL} WHERE parent_task_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([task_id])?;

        let mut subtasks = Vec::new();
        while let Some(row) = rows.next()? {
            subtasks.push(parse_subtask_row(row)?);
        }

        Ok(subtasks)
    }

    fn update_task(&self, task: &mut Task) -> RepoResult<()> {
        task.attrs.validate()?;
        let id = task.id.ok_or(RepoError::NotPersisted("task"))?;
        let user_id = task.user_id.ok_or(RepoError::MissingOwner("task"))?;

        task.attrs.touch_updated(now_epoch_ms());

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                user_id = ?1,
                title = ?2,
                description = ?3,
                status = ?4,
                start_date = ?5,
                end_date = ?6,
                updated_at = ?7
             WHERE id = ?8;",
            params![
                user_id.to_string(),
                task.attrs.title.as_str(),
                task.attrs.description.as_deref(),
                task_status_to_db(task.attrs.status),
                task.attrs.start_date,
                task.attrs.end_date,
                task.attrs.updated_at,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn sync_subtasks(&self, task: &mut Task) -> RepoResult<()> {
        let task_id = task.id.ok_or(RepoError::NotPersisted("task"))?;
        let now = now_epoch_ms();

        let kept: HashSet<SubTaskId> = task
            .subtasks()
            .iter()
            .filter_map(|member| member.id)
            .collect();

        let mut stmt = self
            .conn
            .prepare("SELECT id FROM subtasks WHERE parent_task_id = ?1;")?;
        let mut rows = stmt.query([task_id])?;
        let mut orphans = Vec::new();
        while let Some(row) = rows.next()? {
            let stored_id: SubTaskId = row.get(0)?;
            if !kept.contains(&stored_id) {
                orphans.push(stored_id);
            }
        }

        // Orphan removal: a child detached from its owner's collection
        // does not outlive the reconciliation.
        for orphan_id in orphans {
            self.conn
                .execute("DELETE FROM subtasks WHERE id = ?1;", [orphan_id])?;
        }

        for subtask in task.subtasks_mut() {
            subtask.parent_task_id = Some(task_id);
            if subtask.id.is_some() {
                update_subtask_row(self.conn, subtask, now)?;
            } else {
                insert_subtask(self.conn, subtask, now)?;
            }
        }

        Ok(())
    }

    fn create_subtask(&self, subtask: &mut SubTask) -> RepoResult<SubTaskId> {
        insert_subtask(self.conn, subtask, now_epoch_ms())
    }

    fn update_subtask(&self, subtask: &mut SubTask) -> RepoResult<()> {
        update_subtask_row(self.conn, subtask, now_epoch_ms())
    }

    fn delete_subtask(&self, id: SubTaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM subtasks WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::SubTaskNotFound(id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }
}

fn insert_subtask(conn: &Connection, subtask: &mut SubTask, now: i64) -> RepoResult<SubTaskId> {
    subtask.validate()?;
    let parent_id = subtask
        .parent_task_id
        .ok_or(RepoError::MissingOwner("subtask"))?;

    subtask.attrs.touch_created(now);

    conn.execute(
        "INSERT INTO subtasks (
            parent_task_id,
            title,
            description,
            status,
            start_date,
            end_date,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            parent_id,
            subtask.attrs.title.as_str(),
            subtask.attrs.description.as_deref(),
            task_status_to_db(subtask.attrs.status),
            subtask.attrs.start_date,
            subtask.attrs.end_date,
            subtask.attrs.created_at,
            subtask.attrs.updated_at,
        ],
    )?;

    let id = conn.last_insert_rowid();
    subtask.id = Some(id);
    Ok(id)
}

fn update_subtask_row(conn: &Connection, subtask: &mut SubTask, now: i64) -> RepoResult<()> {
    subtask.validate()?;
    let id = subtask.id.ok_or(RepoError::NotPersisted("subtask"))?;
    let parent_id = subtask
        .parent_task_id
        .ok_or(RepoError::MissingOwner("subtask"))?;

    subtask.attrs.touch_updated(now);

    let changed = conn.execute(
        "UPDATE subtasks
         SET
            parent_task_id = ?1,
            title = ?2,
            description = ?3,
            status = ?4,
            start_date = ?5,
            end_date = ?6,
            updated_at = ?7
         WHERE id = ?8;",
        params![
            parent_id,
            subtask.attrs.title.as_str(),
            subtask.attrs.description.as_deref(),
            task_status_to_db(subtask.attrs.status),
            subtask.attrs.start_date,
            subtask.attrs.end_date,
            subtask.attrs.updated_at,
            id,
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::SubTaskNotFound(id));
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = Uuid::parse_str(&user_id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{user_id_text}` in tasks.user_id"))
    })?;

    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let start_date: Option<i64> = row.get("start_date")?;
    let end_date: Option<i64> = row.get("end_date")?;

    let mut task = Task::new(title, description, start_date, end_date, user_id);
    task.id = Some(row.get("id")?);
    task.attrs.status = parse_status_column(row)?;
    task.attrs.created_at = Some(row.get("created_at")?);
    task.attrs.updated_at = Some(row.get("updated_at")?);
    Ok(task)
}

fn parse_subtask_row(row: &Row<'_>) -> RepoResult<SubTask> {
    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let start_date: Option<i64> = row.get("start_date")?;
    let end_date: Option<i64> = row.get("end_date")?;
    let parent_task_id: TaskId = row.get("parent_task_id")?;

    let mut subtask = SubTask::new(title, description, start_date, end_date, Some(parent_task_id));
    subtask.id = Some(row.get("id")?);
    subtask.attrs.status = parse_status_column(row)?;
    subtask.attrs.created_at = Some(row.get("created_at")?);
    subtask.attrs.updated_at = Some(row.get("updated_at")?);
    Ok(subtask)
}

fn parse_status_column(row: &Row<'_>) -> RepoResult<TaskStatus> {
    let status_text: String = row.get("status")?;
    parse_task_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in status column"))
    })
}

fn task_status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Done => "done",
        TaskStatus::Cancelled => "cancelled",
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "pending" => Some(TaskStatus::Pending),
        "in_progress" => Some(TaskStatus::InProgress),
        "done" => Some(TaskStatus::Done),
        "cancelled" => Some(TaskStatus::Cancelled),
        _ => None,
    }
}
