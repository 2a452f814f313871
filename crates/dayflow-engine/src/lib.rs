//! Business engines for dayflow.
//!
//! Each engine owns a connection pool and exposes the operations callers
//! use directly:
//!
//! - [`TaskEngine`] covers the task lifecycle, including recurring-cycle
//!   rollover, assignment, stop/resume toggling, and analytics reports.
//! - [`TimeLogEngine`] covers day plans and the time logs recorded against
//!   them, including overlap validation and completion propagation.
//!
//! Every mutating operation runs inside a single unit of work (see
//! [`uow::with_uow`]) so multi-row updates commit or roll back together.

#![deny(unsafe_code)]

pub mod analytics;
pub mod task_engine;
pub mod timelog_engine;
pub mod uow;

pub use analytics::TaskAnalytics;
pub use task_engine::TaskEngine;
pub use timelog_engine::TimeLogEngine;
