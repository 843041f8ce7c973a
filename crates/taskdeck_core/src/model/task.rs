//! Task and subtask domain model.
//!
//! # Responsibility
//! - Define the attribute set shared by tasks and subtasks.
//! - Maintain the owned subtask collection through paired mutators.
//! - Derive the completion ratio shown by task views.
//!
//! # Invariants
//! - `status` starts as `TaskStatus::Pending` for every new record.
//! - `created_at`/`updated_at` stay `None` until the persistence boundary
//!   stamps them; `created_at` is never rewritten after that.
//! - Every member of a task's subtask collection carries `parent_task_id`
//!   equal to the owning task's id.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned surrogate id for tasks.
pub type TaskId = i64;

/// Storage-assigned surrogate id for subtasks.
pub type SubTaskId = i64;

/// Task lifecycle state.
///
/// No transition rules are enforced at this layer; any value may be set at
/// any time. Transition policy belongs to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    Pending,
    /// Work is in progress.
    InProgress,
    /// Completed successfully.
    Done,
    /// No longer actionable.
    Cancelled,
}

/// Validation failure for task-shaped records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Attribute set shared by [`Task`] and [`SubTask`].
///
/// Not an entity of its own: it only exists embedded in one of the two
/// owning records. The scheduling window (`start_date`/`end_date`) is not
/// ordered-checked at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAttributes {
    /// Short display title. Must not be empty at persistence time.
    pub title: String,
    /// Optional long-form body.
    pub description: Option<String>,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Scheduled window start, epoch milliseconds.
    pub start_date: Option<i64>,
    /// Scheduled window end, epoch milliseconds.
    pub end_date: Option<i64>,
    /// Stamped exactly once at first persistence, epoch milliseconds.
    pub created_at: Option<i64>,
    /// Stamped at first persistence, refreshed on every persisted update.
    pub updated_at: Option<i64>,
}

impl TaskAttributes {
    /// Creates the shared attribute set with `Pending` status and unset
    /// audit timestamps.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
    ) -> Self {
        Self {
            title: title.into(),
            description,
            status: TaskStatus::Pending,
            start_date,
            end_date,
            created_at: None,
            updated_at: None,
        }
    }

    /// Stamps creation and update times with one shared value.
    ///
    /// Called by the persistence boundary immediately before first save.
    /// A later call is a no-op: `created_at` is set exactly once.
    pub fn touch_created(&mut self, now_epoch_ms: i64) {
        if self.created_at.is_none() {
            self.created_at = Some(now_epoch_ms);
            self.updated_at = Some(now_epoch_ms);
        }
    }

    /// Refreshes `updated_at` only.
    ///
    /// Called by the persistence boundary immediately before every update.
    pub fn touch_updated(&mut self, now_epoch_ms: i64) {
        self.updated_at = Some(now_epoch_ms);
    }

    /// Checks the non-empty-title requirement.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// A unit of work owned by exactly one parent [`Task`].
///
/// Identity is storage-assigned: `id` is `None` until first save. Equality
/// follows persisted identity only; see the `PartialEq` impl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    /// Storage-assigned id. `None` until first save, immutable afterwards.
    pub id: Option<SubTaskId>,
    /// Non-owning back-reference to the owning task. `None` while the
    /// parent itself is unpersisted or after detachment from its
    /// collection. Required at persistence time.
    pub parent_task_id: Option<TaskId>,
    /// Shared task attributes.
    #[serde(flatten)]
    pub attrs: TaskAttributes,
}

impl SubTask {
    /// Creates a subtask with `Pending` status and the given parent handle.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
        parent_task_id: Option<TaskId>,
    ) -> Self {
        Self {
            id: None,
            parent_task_id,
            attrs: TaskAttributes::new(title, description, start_date, end_date),
        }
    }

    /// Whether a storage id has been assigned.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks attribute-level requirements before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        self.attrs.validate()
    }
}

/// Persisted-identity equality: two subtasks are equal iff both carry an
/// assigned id and the ids match. Unpersisted instances are never equal by
/// value, not even to a field-identical copy; use `std::ptr::eq` when
/// reference identity is the question. `Eq` is deliberately not implemented.
impl PartialEq for SubTask {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(own), Some(theirs)) => own == theirs,
            _ => false,
        }
    }
}

/// A unit of work owned by one [`User`](crate::model::user::User) and
/// owning zero or more [`SubTask`]s.
///
/// The subtask collection is private: both sides of the parent/child
/// relationship change only through [`Task::add_subtask`] and
/// [`Task::remove_subtask`], so the back-references cannot diverge from
/// the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Storage-assigned id. `None` until first save, immutable afterwards.
    pub id: Option<TaskId>,
    /// Non-owning back-reference to the owning user. Required at
    /// persistence time; cleared when the owner detaches this task.
    pub user_id: Option<UserId>,
    /// Shared task attributes.
    #[serde(flatten)]
    pub attrs: TaskAttributes,
    /// Owned subtasks in creation order.
    subtasks: Vec<SubTask>,
}

impl Task {
    /// Creates a task with `Pending` status, the given owner, and an empty
    /// subtask collection.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
        user_id: UserId,
    ) -> Self {
        Self {
            id: None,
            user_id: Some(user_id),
            attrs: TaskAttributes::new(title, description, start_date, end_date),
            subtasks: Vec::new(),
        }
    }

    /// Creates a task that adopts `subtasks`, re-parenting every member.
    pub fn with_subtasks(
        title: impl Into<String>,
        description: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
        user_id: UserId,
        subtasks: Vec<SubTask>,
    ) -> Self {
        let mut task = Self::new(title, description, start_date, end_date, user_id);
        for subtask in subtasks {
            task.add_subtask(subtask);
        }
        task
    }

    /// Owned subtasks in creation order.
    pub fn subtasks(&self) -> &[SubTask] {
        &self.subtasks
    }

    /// Mutable member access for the persistence boundary (id/timestamp
    /// back-patching). Not exposed outside the crate.
    pub(crate) fn subtasks_mut(&mut self) -> &mut [SubTask] {
        &mut self.subtasks
    }

    /// Whether a storage id has been assigned.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Inserts `subtask` into the owned collection and points its
    /// back-reference at this task.
    ///
    /// Idempotent by persisted identity: a member carrying the same
    /// assigned id is replaced, leaving exactly one occurrence. Unpersisted
    /// subtasks are always appended.
    pub fn add_subtask(&mut self, mut subtask: SubTask) {
        subtask.parent_task_id = self.id;
        if let Some(id) = subtask.id {
            if let Some(existing) = self.subtasks.iter_mut().find(|member| member.id == Some(id)) {
                *existing = subtask;
                return;
            }
        }
        self.subtasks.push(subtask);
    }

    /// Removes the member with the given assigned id.
    ///
    /// Returns the detached subtask with its back-reference cleared, or
    /// `None` when no member matches. A no-op removal is never an error.
    pub fn remove_subtask(&mut self, id: SubTaskId) -> Option<SubTask> {
        let index = self
            .subtasks
            .iter()
            .position(|member| member.id == Some(id))?;
        let mut subtask = self.subtasks.remove(index);
        subtask.parent_task_id = None;
        Some(subtask)
    }

    /// Derived completion ratio in `[0.0, 1.0]`. Never persisted.
    ///
    /// Without subtasks the task is all-or-nothing: `1.0` iff its own
    /// status is `Done`, else `0.0`. With subtasks the ratio is
    /// done-members over total members.
    pub fn completion_percentage(&self) -> f64 {
        if self.subtasks.is_empty() {
            return if self.attrs.status == TaskStatus::Done {
                1.0
            } else {
                0.0
            };
        }
        let done = self
            .subtasks
            .iter()
            .filter(|member| member.attrs.status == TaskStatus::Done)
            .count();
        done as f64 / self.subtasks.len() as f64
    }

    /// Checks attribute-level requirements for this task and every owned
    /// subtask before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        self.attrs.validate()?;
        for subtask in &self.subtasks {
            subtask.validate()?;
        }
        Ok(())
    }
}

/// Same persisted-identity policy as [`SubTask`].
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(own), Some(theirs)) => own == theirs,
            _ => false,
        }
    }
}
