//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for accounts, tasks
//!   and subtasks.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths enforce model `validate()` before SQL mutations.
//! - The repository is the only place that assigns storage ids and stamps
//!   lifecycle timestamps (via the model's explicit touch methods).
//! - Repository APIs return semantic errors (`NotFound`, `EmailTaken`) in
//!   addition to DB transport errors.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod task_repo;
pub mod user_repo;

/// Wall-clock time in epoch milliseconds for lifecycle stamping.
pub(crate) fn now_epoch_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        // Pre-epoch clocks clamp to 0.
        Err(_) => 0,
    }
}
