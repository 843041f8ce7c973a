//! Task use-case service.
//!
//! # Responsibility
//! - Provide stable task entry points for core callers.
//! - Pair collection mutators (`add_subtask`/`remove_subtask`) with the
//!   matching insert/delete so the object graph and storage stay in step.
//!
//! # Invariants
//! - Attaching a subtask requires a persisted parent task.
//! - A no-op removal is never an error.

use crate::model::task::{SubTask, SubTaskId, Task, TaskId, TaskStatus};
use crate::model::user::UserId;
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};

/// Use-case service wrapper for task operations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a task (and its owned subtasks) through the repository.
    pub fn create_task(&self, task: &mut Task) -> RepoResult<TaskId> {
        self.repo.create_task(task)
    }

    /// Loads one task with its subtask collection hydrated.
    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Lists a user's tasks in creation order.
    pub fn list_tasks_for_user(&self, user_id: UserId) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks_for_user(user_id)
    }

    /// Updates a task's own columns.
    pub fn update_task(&self, task: &mut Task) -> RepoResult<()> {
        self.repo.update_task(task)
    }

    /// Reconciles the stored subtask rows with the in-memory collection.
    pub fn sync_subtasks(&self, task: &mut Task) -> RepoResult<()> {
        self.repo.sync_subtasks(task)
    }

    /// Attaches `subtask` to `task` and persists it in one step.
    ///
    /// # Contract
    /// - `task` must be persisted so the child can carry its
    ///   back-reference.
    /// - A subtask that already has an id is updated instead of inserted.
    /// - Returns the child's storage id.
    pub fn add_subtask(&self, task: &mut Task, mut subtask: SubTask) -> RepoResult<SubTaskId> {
        let task_id = task.id.ok_or(RepoError::NotPersisted("task"))?;
        subtask.parent_task_id = Some(task_id);

        let subtask_id = if let Some(existing_id) = subtask.id {
            self.repo.update_subtask(&mut subtask)?;
            existing_id
        } else {
            self.repo.create_subtask(&mut subtask)?
        };

        task.add_subtask(subtask);
        Ok(subtask_id)
    }

    /// Detaches the subtask with the given id and deletes its row
    /// (orphan removal).
    ///
    /// Returns the detached subtask, or `None` when the task had no such
    /// member. An already-deleted row is tolerated.
    pub fn remove_subtask(&self, task: &mut Task, id: SubTaskId) -> RepoResult<Option<SubTask>> {
        let Some(detached) = task.remove_subtask(id) else {
            return Ok(None);
        };

        match self.repo.delete_subtask(id) {
            Ok(()) | Err(RepoError::SubTaskNotFound(_)) => Ok(Some(detached)),
            Err(err) => Err(err),
        }
    }

    /// Sets the lifecycle state and persists the change.
    ///
    /// Any value may be set at any time; there is no transition table.
    pub fn set_status(&self, task: &mut Task, status: TaskStatus) -> RepoResult<()> {
        task.attrs.status = status;
        self.repo.update_task(task)
    }

    /// Deletes a task; owned subtasks go with it.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.repo.delete_task(id)
    }
}
