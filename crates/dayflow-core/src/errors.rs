//! Engine error types.
//!
//! All errors are structured with typed variants for each failure mode.
//! The three caller-facing kinds map onto the operation contracts:
//!
//! - [`EngineError::NotFound`] — a referenced entity is absent
//! - [`EngineError::BadRequest`] — invalid input or an illegal transition,
//!   raised before any mutation
//! - [`EngineError::Permission`] — the principal is neither owner nor
//!   assignee of the entity it touches
//!
//! Storage failures ([`EngineError::Database`], [`EngineError::Pool`])
//! propagate unchanged after the surrounding unit of work rolls back —
//! they are never swallowed or replaced.

use thiserror::Error;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool exhausted or unavailable.
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type (e.g., "Task", "DayPlan", "TimeLog").
        entity: &'static str,
        /// The ID that was looked up.
        id: String,
    },

    /// Invalid input or illegal state transition.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The principal is not allowed to perform the operation.
    #[error("Permission denied: {0}")]
    Permission(String),
}

impl EngineError {
    /// Create a not-found error for a task.
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Task",
            id: id.into(),
        }
    }

    /// Create a not-found error for a day plan.
    pub fn plan_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "DayPlan",
            id: id.into(),
        }
    }

    /// Create a not-found error for a time log.
    pub fn time_log_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "TimeLog",
            id: id.into(),
        }
    }

    /// Create a not-found error for a stop event.
    pub fn stop_event_not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "StopEvent",
            id: task_id.into(),
        }
    }

    /// Create a bad-request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a permission error.
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }
}
