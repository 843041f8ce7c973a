//! Domain model for user/task/subtask ownership.
//!
//! # Responsibility
//! - Define the canonical entity records persisted by the repository layer.
//! - Keep both sides of every parent/child relationship consistent through
//!   paired mutator operations.
//!
//! # Invariants
//! - Ownership flows one direction: `User` owns `Task`s, `Task` owns
//!   `SubTask`s. Children hold a non-owning id back-reference to their
//!   parent, never a strong pointer.
//! - Lifecycle timestamps are stamped by the persistence boundary via
//!   explicit touch methods, never implicitly.

pub mod task;
pub mod user;
