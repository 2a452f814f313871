//! Entity types for the dayflow data model.
//!
//! All serializable types use `camelCase` wire names. Mutations go through
//! explicit params/patch structs with named optional fields — there is no
//! free-form field map anywhere in the engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Task status in the workflow.
///
/// `Stopped` only appears on progress snapshots recorded while a
/// repetitive task was paused; a live task tracks pausing via
/// `is_stopped` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, no work logged yet.
    Pending,
    /// Work has been logged against it.
    InProgress,
    /// Done hours reached the estimate.
    Completed,
    /// Snapshot marker for a paused interval.
    Stopped,
}

impl TaskStatus {
    /// SQL string representation (matches the `SQLite` CHECK constraint).
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }

    /// Parse from the SQL string representation. Unknown values map to
    /// `Pending`.
    #[must_use]
    pub fn from_sql(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "stopped" => Self::Stopped,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// A task. Forms a tree through `main_task_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable ID (`task-` prefixed UUID v7).
    pub id: String,
    /// What the task is.
    pub description: String,
    /// Current cycle start.
    pub start_date: DateTime<Utc>,
    /// Current cycle end / deadline.
    pub end_date: DateTime<Utc>,
    /// Estimated effort in hours.
    pub estimated_hr: f64,
    /// Hours of completed work credited this cycle.
    pub done_hr: f64,
    /// Workflow status.
    pub status: TaskStatus,
    /// Whether the task rolls over to a new cycle when its end passes.
    pub is_repetitive: bool,
    /// Whether a repetitive task is currently paused.
    pub is_stopped: bool,
    /// Parent task, when this is a subtask.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_task_id: Option<String>,
    /// Owning user.
    pub owner_id: String,
    /// IDs of direct subtasks.
    pub subtasks: Vec<String>,
    /// IDs of assigned users.
    pub assignees: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of one task cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    /// Auto-incremented ID.
    pub id: i64,
    /// The task this snapshot belongs to.
    pub task_id: String,
    /// Cycle start.
    pub start_date: DateTime<Utc>,
    /// Cycle end.
    pub end_date: DateTime<Utc>,
    /// Status at snapshot time.
    pub status: TaskStatus,
    /// Hours done in the cycle.
    pub done_hr: f64,
    /// Estimate at snapshot time.
    pub estimated_hr: f64,
    /// When the snapshot was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Pause marker for a repetitive task. Exists only while stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEvent {
    /// The paused task.
    pub task_id: String,
    /// When it was paused.
    pub stopped_at: DateTime<Utc>,
}

/// One user's plan for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// Stable ID (`plan-` prefixed UUID v7).
    pub id: String,
    /// The date this plan covers.
    pub date: NaiveDate,
    /// Owning user.
    pub user_id: String,
}

/// A day plan together with its time logs, ordered by start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlanWithLogs {
    /// The plan itself.
    #[serde(flatten)]
    pub plan: DayPlan,
    /// Logs on this plan.
    pub time_logs: Vec<TimeLog>,
}

/// A logged work interval against a task, within a day plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    /// Stable ID (`log-` prefixed UUID v7).
    pub id: String,
    /// The task worked on.
    pub task_id: String,
    /// The plan this log belongs to.
    pub plan_id: String,
    /// Interval start (inclusive).
    pub start_time: DateTime<Utc>,
    /// Interval end (exclusive).
    pub end_time: DateTime<Utc>,
    /// Whether the interval has been credited to the task. Transitions
    /// false → true exactly once.
    pub done: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation params
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateParams {
    /// What the task is (required).
    pub description: String,
    /// Cycle start. Defaults to now when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Cycle end / deadline (required).
    pub end_date: DateTime<Utc>,
    /// Estimated effort in hours.
    pub estimated_hr: f64,
    /// Whether the task rolls over.
    #[serde(default)]
    pub is_repetitive: bool,
    /// Parent task (makes this a subtask).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_task_id: Option<String>,
}

/// Partial update for a task. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New cycle start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// New cycle end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// New estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hr: Option<f64>,
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Flip the repetitive flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_repetitive: Option<bool>,
    /// Re-parent under another task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_task_id: Option<String>,
}

impl TaskPatch {
    /// Whether the patch carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.estimated_hr.is_none()
            && self.status.is_none()
            && self.is_repetitive.is_none()
            && self.main_task_id.is_none()
    }
}

/// Parameters for creating a time log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogCreateParams {
    /// The task worked on.
    pub task_id: String,
    /// The plan to attach the log to.
    pub plan_id: String,
    /// Interval start (inclusive).
    pub start_time: DateTime<Utc>,
    /// Interval end (exclusive).
    pub end_time: DateTime<Utc>,
}

/// Values for one progress snapshot insert.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// The task the snapshot is for.
    pub task_id: String,
    /// Cycle start.
    pub start_date: DateTime<Utc>,
    /// Cycle end.
    pub end_date: DateTime<Utc>,
    /// Status at snapshot time.
    pub status: TaskStatus,
    /// Hours done in the cycle.
    pub done_hr: f64,
    /// Estimate at snapshot time.
    pub estimated_hr: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_sql_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Stopped,
        ] {
            assert_eq!(TaskStatus::from_sql(status.as_sql()), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        assert_eq!(TaskStatus::from_sql("archived"), TaskStatus::Pending);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            estimated_hr: Some(4.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task {
            id: "task-1".to_string(),
            description: "write report".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            estimated_hr: 4.0,
            done_hr: 0.0,
            status: TaskStatus::Pending,
            is_repetitive: false,
            is_stopped: false,
            main_task_id: None,
            owner_id: "u1".to_string(),
            subtasks: vec![],
            assignees: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["estimatedHr"], 4.0);
        assert_eq!(json["status"], "pending");
        assert!(json.get("mainTaskId").is_none());
    }
}
