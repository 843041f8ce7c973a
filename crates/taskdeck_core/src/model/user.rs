//! User account domain model.
//!
//! # Responsibility
//! - Define the account record that owns top-level tasks.
//! - Maintain the owned task collection through paired mutators.
//!
//! # Invariants
//! - `id` is generated at construction and never changes.
//! - `google_user_info_json` is an uninterpreted identity-provider blob;
//!   this layer stores it verbatim and never parses it.
//! - Every member of the task collection carries `user_id` equal to this
//!   user's id.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable account identifier, generated at construction.
pub type UserId = Uuid;

/// Validation failure for user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    /// Email is empty after trimming.
    EmptyEmail,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
        }
    }
}

impl Error for UserValidationError {}

/// Account record owning zero or more tasks.
///
/// Unlike task/subtask ids, the user id exists from construction, so
/// equality is plain id equality. Email uniqueness across all users is a
/// storage-layer contract surfaced by the user repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Generated at construction, immutable.
    pub id: UserId,
    /// Required sign-in address. Globally unique in storage.
    pub email: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Optional avatar location.
    pub picture_url: Option<String>,
    /// Raw identity-provider payload, stored as-is.
    pub google_user_info_json: Option<String>,
    /// Stamped exactly once at first persistence, epoch milliseconds.
    pub created_at: Option<i64>,
    /// Owned tasks in creation order.
    tasks: Vec<Task>,
}

impl User {
    /// Creates an account with a freshly generated id and no tasks.
    pub fn new(
        email: impl Into<String>,
        full_name: Option<String>,
        picture_url: Option<String>,
        google_user_info_json: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name,
            picture_url,
            google_user_info_json,
            created_at: None,
            tasks: Vec::new(),
        }
    }

    /// Creates an account that adopts `tasks`, re-owning every member.
    pub fn with_tasks(
        email: impl Into<String>,
        full_name: Option<String>,
        picture_url: Option<String>,
        google_user_info_json: Option<String>,
        tasks: Vec<Task>,
    ) -> Self {
        let mut user = Self::new(email, full_name, picture_url, google_user_info_json);
        for task in tasks {
            user.add_task(task);
        }
        user
    }

    /// Owned tasks in creation order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Mutable member access for the persistence boundary.
    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    /// Replaces the whole collection from storage, re-owning every member.
    /// Only the persistence boundary may call this (lazy hydration).
    pub(crate) fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            self.add_task(task);
        }
    }

    /// Inserts `task` into the owned collection and points its
    /// back-reference at this user.
    ///
    /// Idempotent by persisted identity, like `Task::add_subtask`.
    pub fn add_task(&mut self, mut task: Task) {
        task.user_id = Some(self.id);
        if let Some(id) = task.id {
            if let Some(existing) = self.tasks.iter_mut().find(|member| member.id == Some(id)) {
                *existing = task;
                return;
            }
        }
        self.tasks.push(task);
    }

    /// Removes the member with the given assigned id.
    ///
    /// Returns the detached task with its owner reference cleared, or
    /// `None` when no member matches. A no-op removal is never an error.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|member| member.id == Some(id))?;
        let mut task = self.tasks.remove(index);
        task.user_id = None;
        Some(task)
    }

    /// Stamps the creation time once.
    ///
    /// Called by the persistence boundary immediately before first save;
    /// later calls are no-ops.
    pub fn touch_created(&mut self, now_epoch_ms: i64) {
        if self.created_at.is_none() {
            self.created_at = Some(now_epoch_ms);
        }
    }

    /// Checks the non-empty-email requirement.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(())
    }
}

/// Id-based equality; the id always exists, so this is total.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}
