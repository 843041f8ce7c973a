//! User account use-case service.
//!
//! # Responsibility
//! - Provide stable account entry points for core callers.
//! - Turn identity-provider sign-in data into persisted accounts.

use crate::model::user::{User, UserId};
use crate::repo::user_repo::{UserRepoResult, UserRepository};

/// Use-case service wrapper for account operations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

/// Request model for registering an account from identity-provider data.
///
/// `google_user_info_json` is carried verbatim; this layer never parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub picture_url: Option<String>,
    pub google_user_info_json: Option<String>,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Constructs and persists a new account.
    ///
    /// # Contract
    /// - The account id is generated here, before first save.
    /// - A duplicate email surfaces as `UserRepoError::EmailTaken`.
    pub fn register_user(&self, request: RegisterUserRequest) -> UserRepoResult<User> {
        let mut user = User::new(
            request.email,
            request.full_name,
            request.picture_url,
            request.google_user_info_json,
        );
        self.repo.create_user(&mut user)?;
        Ok(user)
    }

    /// Loads one account by id; the task collection stays unloaded.
    pub fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    /// Loads one account by its unique email.
    pub fn get_user_by_email(&self, email: &str) -> UserRepoResult<Option<User>> {
        self.repo.get_user_by_email(email)
    }

    /// Materializes the owned task graph onto the given account.
    pub fn hydrate_tasks(&self, user: &mut User) -> UserRepoResult<()> {
        self.repo.hydrate_tasks(user)
    }

    /// Persists profile field changes.
    pub fn update_profile(&self, user: &User) -> UserRepoResult<()> {
        self.repo.update_user(user)
    }

    /// Deletes an account with everything it owns.
    pub fn delete_user(&self, id: UserId) -> UserRepoResult<()> {
        self.repo.delete_user(id)
    }
}
