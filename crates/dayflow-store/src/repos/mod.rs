//! Stateless repositories over `&Connection`.
//!
//! All methods are pure SQL translation — no validation, no
//! authorization, no transactions. Those belong to the engines; a repo
//! method called with a `&Transaction` participates in the caller's unit
//! of work (`Transaction` derefs to `Connection`).

pub mod dayplan;
pub mod progress;
pub mod task;
pub mod timelog;

pub use dayplan::PlanRepo;
pub use progress::{ProgressRepo, StopRepo};
pub use task::TaskRepo;
pub use timelog::TimeLogRepo;

use uuid::Uuid;

/// Generate a prefixed UUID v7 ID (time-ordered).
pub(crate) fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7())
}
