//! Persistence entity core for Taskdeck.
//! This crate is the single source of truth for ownership invariants:
//! users own tasks, tasks own subtasks, and both sides of every
//! relationship move only through paired operations.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{
    SubTask, SubTaskId, Task, TaskAttributes, TaskId, TaskStatus, TaskValidationError,
};
pub use model::user::{User, UserId, UserValidationError};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepoError, UserRepoResult, UserRepository};
pub use service::task_service::TaskService;
pub use service::user_service::{RegisterUserRequest, UserService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
