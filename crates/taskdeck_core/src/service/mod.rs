//! Use-case services wrapping the repository layer.
//!
//! # Responsibility
//! - Pair in-memory relationship maintenance with its persistence effect,
//!   so callers cannot update one side of a parent/child link without the
//!   other.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

pub mod task_service;
pub mod user_service;
