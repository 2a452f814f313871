//! Task lifecycle engine.
//!
//! Owns creation, retrieval, updates, deletion, assignment, the
//! stop/resume toggle for repetitive tasks, recurring-cycle rollover, and
//! the analytics report entry point. Every operation authorizes against
//! the calling principal before mutating anything, and every mutation
//! runs in a single unit of work.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tracing::{debug, warn};

use dayflow_core::{EngineError, Principal};
use dayflow_store::ConnectionPool;
use dayflow_store::repos::{ProgressRepo, StopRepo, TaskRepo};
use dayflow_store::types::{
    ProgressSnapshot, Task, TaskCreateParams, TaskPatch, TaskProgress, TaskStatus,
};

use crate::analytics::{self, TaskAnalytics};
use crate::uow::with_uow;

/// Upper bound on cycles advanced in one rollover pass. A task neglected
/// for longer resumes from wherever the cap leaves it on the next read.
const MAX_ROLLOVER_CYCLES: u32 = 100;

/// Engine for task operations.
#[derive(Clone)]
pub struct TaskEngine {
    pool: ConnectionPool,
}

impl TaskEngine {
    /// Create a task engine over a connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Create a task owned by the principal.
    ///
    /// Subtask creation requires access to the parent. `start_date`
    /// defaults to now; an explicit past start is rejected.
    pub fn create_task(
        &self,
        input: &TaskCreateParams,
        principal: &Principal,
    ) -> Result<Task, EngineError> {
        with_uow(&self.pool, |tx| {
            if let Some(ref parent_id) = input.main_task_id {
                let parent = TaskRepo::get_task(tx, parent_id)?
                    .ok_or_else(|| EngineError::task_not_found(parent_id))?;
                if !is_owner_or_assignee(&parent, principal) {
                    return Err(EngineError::permission(
                        "Cannot add a subtask to another user's task",
                    ));
                }
            }

            let now = Utc::now();
            let start_date = match input.start_date {
                Some(start) if start < now => {
                    return Err(EngineError::bad_request("Start date cannot be in the past"));
                }
                Some(start) => start,
                None => now,
            };
            if input.estimated_hr < 0.0 {
                return Err(EngineError::bad_request("Estimated hours cannot be negative"));
            }
            if input.end_date < start_date {
                return Err(EngineError::bad_request(
                    "End date cannot be before start date",
                ));
            }

            let task = TaskRepo::create_task(tx, input, start_date, &principal.id)?;
            debug!(task_id = %task.id, owner = %principal.id, "task created");
            Ok(task)
        })
    }

    /// Fetch one task. Owner or assignee only.
    pub fn get_task(&self, id: &str, principal: &Principal) -> Result<Task, EngineError> {
        let conn = self.pool.get()?;
        let task =
            TaskRepo::get_task(&conn, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
        authorize_view(&task, principal)?;
        Ok(task)
    }

    /// List the principal's tasks (owned or assigned), rolling over any
    /// repetitive task whose cycle end has passed. The page fetch, the
    /// rollovers, and their snapshots commit or roll back together.
    ///
    /// `skip`/`limit` window the task table before the owner/assignee
    /// filter: they bound rows scanned, not rows returned, so a page may
    /// come back short while later pages still hold the caller's tasks.
    pub fn get_tasks(
        &self,
        principal: &Principal,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Task>, EngineError> {
        with_uow(&self.pool, |tx| {
            let now = Utc::now();
            let page = TaskRepo::list_tasks(tx, skip, limit)?;
            page.into_iter()
                .filter(|t| is_owner_or_assignee(t, principal))
                .map(|t| roll_cycles(tx, t, now))
                .collect()
        })
    }

    /// Apply a partial update. Owner or assignee only.
    pub fn update_task(
        &self,
        id: &str,
        patch: &TaskPatch,
        principal: &Principal,
    ) -> Result<Task, EngineError> {
        with_uow(&self.pool, |tx| {
            let task =
                TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
            authorize_view(&task, principal)?;

            let now = Utc::now();
            match (patch.start_date, patch.end_date) {
                (Some(start), Some(end)) => {
                    if start < now {
                        return Err(EngineError::bad_request("Start date cannot be in the past"));
                    }
                    if end < start {
                        return Err(EngineError::bad_request(
                            "End date cannot be before start date",
                        ));
                    }
                }
                (Some(start), None) => {
                    if start < now {
                        return Err(EngineError::bad_request("Start date cannot be in the past"));
                    }
                }
                (None, Some(end)) => {
                    if end < now {
                        return Err(EngineError::bad_request("End date cannot be in the past"));
                    }
                    if end < task.start_date {
                        return Err(EngineError::bad_request(
                            "End date cannot be before start date",
                        ));
                    }
                }
                (None, None) => {}
            }
            if let Some(est) = patch.estimated_hr {
                if est < 0.0 {
                    return Err(EngineError::bad_request("Estimated hours cannot be negative"));
                }
            }
            if let Some(ref parent_id) = patch.main_task_id {
                let _ = TaskRepo::get_task(tx, parent_id)?
                    .ok_or_else(|| EngineError::task_not_found(parent_id))?;
                if TaskRepo::would_create_cycle(tx, id, parent_id)? {
                    return Err(EngineError::bad_request(
                        "Re-parenting would create a cycle in the task tree",
                    ));
                }
            }

            TaskRepo::update_task(tx, id, patch)?.ok_or_else(|| EngineError::task_not_found(id))
        })
    }

    /// Delete a task and everything hanging off it. Owner only.
    pub fn delete_task(&self, id: &str, principal: &Principal) -> Result<(), EngineError> {
        with_uow(&self.pool, |tx| {
            let task =
                TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
            if task.owner_id != principal.id {
                return Err(EngineError::permission("Only the owner can delete a task"));
            }
            let _ = TaskRepo::delete_task(tx, id)?;
            debug!(task_id = %id, "task deleted");
            Ok(())
        })
    }

    /// Assign a user to a task. Owner only; double-assignment rejected.
    pub fn assign_user_to_task(
        &self,
        id: &str,
        user_id: &str,
        principal: &Principal,
    ) -> Result<Task, EngineError> {
        with_uow(&self.pool, |tx| {
            let task =
                TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
            if task.owner_id != principal.id {
                return Err(EngineError::permission("Only the owner can assign users"));
            }
            if task.assignees.iter().any(|a| a == user_id) {
                return Err(EngineError::bad_request("User is already assigned"));
            }
            TaskRepo::add_assignee(tx, id, user_id)?;
            TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))
        })
    }

    /// Stop (`stop = true`) or resume (`stop = false`) a repetitive task.
    ///
    /// Stopping records a [`dayflow_store::types::StopEvent`]. Resuming
    /// restarts the cycle clock at now and records the paused interval as
    /// a `stopped` progress snapshot.
    pub fn toggle_task(
        &self,
        id: &str,
        stop: bool,
        principal: &Principal,
    ) -> Result<Task, EngineError> {
        with_uow(&self.pool, |tx| {
            let task =
                TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
            authorize_view(&task, principal)?;
            if !task.is_repetitive {
                return Err(EngineError::bad_request(
                    "Only repetitive tasks can be stopped or resumed",
                ));
            }

            let now = Utc::now();
            if stop {
                if task.is_stopped {
                    return Err(EngineError::bad_request("Task is already stopped"));
                }
                TaskRepo::set_stop_state(tx, id, true, None)?;
                StopRepo::create(tx, id, now)?;
                debug!(task_id = %id, "task stopped");
            } else {
                if !task.is_stopped {
                    return Err(EngineError::bad_request("Task is already running"));
                }
                let event = StopRepo::get(tx, id)?
                    .ok_or_else(|| EngineError::stop_event_not_found(id))?;
                TaskRepo::set_stop_state(tx, id, false, Some(now))?;
                ProgressRepo::insert(
                    tx,
                    &ProgressSnapshot {
                        task_id: id.to_string(),
                        start_date: event.stopped_at,
                        end_date: now,
                        status: TaskStatus::Stopped,
                        done_hr: 0.0,
                        estimated_hr: task.estimated_hr,
                    },
                )?;
                let _ = StopRepo::delete(tx, id)?;
                debug!(task_id = %id, "task resumed");
            }

            TaskRepo::get_task(tx, id)?.ok_or_else(|| EngineError::task_not_found(id))
        })
    }

    /// Paginated cycle-snapshot history. Owner or assignee only.
    pub fn get_progress(
        &self,
        id: &str,
        principal: &Principal,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TaskProgress>, EngineError> {
        let conn = self.pool.get()?;
        let task =
            TaskRepo::get_task(&conn, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
        authorize_view(&task, principal)?;
        ProgressRepo::list(&conn, id, skip, limit)
    }

    /// Build the full analytics report for a task. Owner or assignee only.
    pub fn get_task_analytics(
        &self,
        id: &str,
        principal: &Principal,
    ) -> Result<TaskAnalytics, EngineError> {
        let conn = self.pool.get()?;
        let task =
            TaskRepo::get_task(&conn, id)?.ok_or_else(|| EngineError::task_not_found(id))?;
        authorize_view(&task, principal)?;
        let progress = ProgressRepo::list_all(&conn, id)?;
        let stops: Vec<_> = StopRepo::get(&conn, id)?.into_iter().collect();
        Ok(analytics::analyze(&task, &progress, &stops, Utc::now()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_owner_or_assignee(task: &Task, principal: &Principal) -> bool {
    task.owner_id == principal.id || task.assignees.iter().any(|a| *a == principal.id)
}

fn authorize_view(task: &Task, principal: &Principal) -> Result<(), EngineError> {
    if is_owner_or_assignee(task, principal) {
        Ok(())
    } else {
        Err(EngineError::permission("Not the task owner or an assignee"))
    }
}

/// Advance an overdue repetitive task cycle by cycle up to the cap.
///
/// Each elapsed cycle is snapshotted to `task_progress` as it stood; the
/// task row itself is written once at the end, and only if at least one
/// cycle advanced. A cycle with no positive duration breaks before its
/// snapshot: it can never catch up to now, and recording it would write
/// a new snapshot on every listing.
fn roll_cycles(
    conn: &Connection,
    mut task: Task,
    now: DateTime<Utc>,
) -> Result<Task, EngineError> {
    let mut advanced: u32 = 0;

    while task.is_repetitive && !task.is_stopped && task.end_date <= now {
        if advanced >= MAX_ROLLOVER_CYCLES {
            warn!(task_id = %task.id, cap = MAX_ROLLOVER_CYCLES, "rollover cap reached");
            break;
        }
        let interval = task.end_date - task.start_date;
        if interval <= Duration::zero() {
            break;
        }
        ProgressRepo::insert(
            conn,
            &ProgressSnapshot {
                task_id: task.id.clone(),
                start_date: task.start_date,
                end_date: task.end_date,
                status: task.status,
                done_hr: task.done_hr,
                estimated_hr: task.estimated_hr,
            },
        )?;
        task.start_date = task.end_date;
        task.end_date += interval;
        task.status = TaskStatus::InProgress;
        task.done_hr = 0.0;
        advanced += 1;
    }

    if advanced > 0 {
        TaskRepo::save_cycle_state(conn, &task)?;
        debug!(task_id = %task.id, cycles = advanced, "rolled task cycles");
    }
    Ok(task)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use dayflow_store::connection::{self, ConnectionConfig};
    use dayflow_store::migrations::run_migrations;

    fn setup_engine() -> TaskEngine {
        let pool = connection::new_in_memory(&ConnectionConfig::default()).unwrap();
        run_migrations(&pool.get().unwrap()).unwrap();
        TaskEngine::new(pool)
    }

    fn alice() -> Principal {
        Principal::user("alice")
    }

    fn bob() -> Principal {
        Principal::user("bob")
    }

    fn params_for(desc: &str) -> TaskCreateParams {
        TaskCreateParams {
            description: desc.to_string(),
            start_date: None,
            end_date: Utc::now() + Duration::days(1),
            estimated_hr: 4.0,
            is_repetitive: false,
            main_task_id: None,
        }
    }

    /// Insert a repetitive task directly with an already-elapsed cycle;
    /// the engine rejects past dates on creation.
    fn seed_overdue_task(engine: &TaskEngine, cycles_past: i64) -> Task {
        let conn = engine.pool.get().unwrap();
        let end = Utc::now() - Duration::days(cycles_past - 1) + Duration::hours(-12);
        let start = end - Duration::days(1);
        let params = TaskCreateParams {
            description: "daily review".to_string(),
            start_date: None,
            end_date: end,
            estimated_hr: 2.0,
            is_repetitive: true,
            main_task_id: None,
        };
        TaskRepo::create_task(&conn, &params, start, "alice").unwrap()
    }

    #[test]
    fn test_create_task_defaults() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("write report"), &alice()).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!((task.done_hr - 0.0).abs() < f64::EPSILON);
        assert_eq!(task.owner_id, "alice");
        assert!(task.start_date <= task.end_date);
    }

    #[test]
    fn test_create_task_rejects_past_start() {
        let engine = setup_engine();
        let mut params = params_for("t");
        params.start_date = Some(Utc::now() - Duration::hours(1));
        assert_matches!(
            engine.create_task(&params, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_create_task_rejects_negative_estimate() {
        let engine = setup_engine();
        let mut params = params_for("t");
        params.estimated_hr = -1.0;
        assert_matches!(
            engine.create_task(&params, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_create_task_rejects_end_before_start() {
        let engine = setup_engine();
        let mut params = params_for("t");
        params.start_date = Some(Utc::now() + Duration::days(2));
        params.end_date = Utc::now() + Duration::days(1);
        assert_matches!(
            engine.create_task(&params, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_create_subtask_requires_parent_access() {
        let engine = setup_engine();
        let parent = engine.create_task(&params_for("parent"), &alice()).unwrap();
        let mut params = params_for("child");
        params.main_task_id = Some(parent.id.clone());
        assert_matches!(
            engine.create_task(&params, &bob()),
            Err(EngineError::Permission(_))
        );
        // The owner can
        let child = engine.create_task(&params, &alice()).unwrap();
        assert_eq!(child.main_task_id.as_deref(), Some(parent.id.as_str()));
    }

    #[test]
    fn test_create_subtask_missing_parent() {
        let engine = setup_engine();
        let mut params = params_for("child");
        params.main_task_id = Some("task-missing".to_string());
        assert_matches!(
            engine.create_task(&params, &alice()),
            Err(EngineError::NotFound { .. })
        );
    }

    #[test]
    fn test_get_task_authorization() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        assert_matches!(
            engine.get_task(&task.id, &bob()),
            Err(EngineError::Permission(_))
        );
        engine.assign_user_to_task(&task.id, "bob", &alice()).unwrap();
        assert!(engine.get_task(&task.id, &bob()).is_ok());
    }

    #[test]
    fn test_get_task_missing() {
        let engine = setup_engine();
        assert_matches!(
            engine.get_task("task-missing", &alice()),
            Err(EngineError::NotFound { .. })
        );
    }

    #[test]
    fn test_get_tasks_filters_to_principal() {
        let engine = setup_engine();
        engine.create_task(&params_for("mine"), &alice()).unwrap();
        engine.create_task(&params_for("theirs"), &bob()).unwrap();

        let tasks = engine.get_tasks(&alice(), 0, 100).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "mine");
    }

    #[test]
    fn test_get_tasks_pages_window_the_table_not_the_result() {
        let engine = setup_engine();
        engine.create_task(&params_for("bob 1"), &bob()).unwrap();
        engine.create_task(&params_for("bob 2"), &bob()).unwrap();
        engine.create_task(&params_for("alice 1"), &alice()).unwrap();

        // The first window covers only bob's rows, so alice sees nothing
        let page = engine.get_tasks(&alice(), 0, 2).unwrap();
        assert!(page.is_empty());
        // Her task surfaces in the next window
        let page = engine.get_tasks(&alice(), 2, 2).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].description, "alice 1");
    }

    #[test]
    fn test_update_task_rejects_end_before_current_start() {
        let engine = setup_engine();
        let mut params = params_for("t");
        params.start_date = Some(Utc::now() + Duration::days(5));
        params.end_date = Utc::now() + Duration::days(6);
        let task = engine.create_task(&params, &alice()).unwrap();

        // New end in the future but before the existing start
        let patch = TaskPatch {
            end_date: Some(Utc::now() + Duration::days(2)),
            ..Default::default()
        };
        assert_matches!(
            engine.update_task(&task.id, &patch, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_update_task_by_assignee() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        engine.assign_user_to_task(&task.id, "bob", &alice()).unwrap();
        let patch = TaskPatch {
            description: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = engine.update_task(&task.id, &patch, &bob()).unwrap();
        assert_eq!(updated.description, "renamed");
    }

    #[test]
    fn test_update_rejects_reparent_cycle() {
        let engine = setup_engine();
        let a = engine.create_task(&params_for("a"), &alice()).unwrap();
        let mut b_params = params_for("b");
        b_params.main_task_id = Some(a.id.clone());
        let b = engine.create_task(&b_params, &alice()).unwrap();

        let patch = TaskPatch {
            main_task_id: Some(b.id.clone()),
            ..Default::default()
        };
        assert_matches!(
            engine.update_task(&a.id, &patch, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_delete_task_owner_only() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        engine.assign_user_to_task(&task.id, "bob", &alice()).unwrap();
        // Assignees can view but not delete
        assert_matches!(
            engine.delete_task(&task.id, &bob()),
            Err(EngineError::Permission(_))
        );
        engine.delete_task(&task.id, &alice()).unwrap();
        assert_matches!(
            engine.get_task(&task.id, &alice()),
            Err(EngineError::NotFound { .. })
        );
    }

    #[test]
    fn test_assign_twice_rejected() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        engine.assign_user_to_task(&task.id, "bob", &alice()).unwrap();
        assert_matches!(
            engine.assign_user_to_task(&task.id, "bob", &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_assign_requires_owner() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        assert_matches!(
            engine.assign_user_to_task(&task.id, "carol", &bob()),
            Err(EngineError::Permission(_))
        );
    }

    #[test]
    fn test_toggle_requires_repetitive() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        assert_matches!(
            engine.toggle_task(&task.id, true, &alice()),
            Err(EngineError::BadRequest(_))
        );
    }

    #[test]
    fn test_toggle_stop_resume_lifecycle() {
        let engine = setup_engine();
        let mut params = params_for("daily");
        params.is_repetitive = true;
        let task = engine.create_task(&params, &alice()).unwrap();

        let stopped = engine.toggle_task(&task.id, true, &alice()).unwrap();
        assert!(stopped.is_stopped);
        // Double-stop rejected
        assert_matches!(
            engine.toggle_task(&task.id, true, &alice()),
            Err(EngineError::BadRequest(_))
        );

        let resumed = engine.toggle_task(&task.id, false, &alice()).unwrap();
        assert!(!resumed.is_stopped);
        assert!(resumed.start_date > task.start_date);
        // Double-resume rejected
        assert_matches!(
            engine.toggle_task(&task.id, false, &alice()),
            Err(EngineError::BadRequest(_))
        );

        // The paused interval was recorded as a stopped snapshot
        let history = engine.get_progress(&task.id, &alice(), 0, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TaskStatus::Stopped);
        assert!((history[0].done_hr - 0.0).abs() < f64::EPSILON);

        // Stop event cleaned up
        let conn = engine.pool.get().unwrap();
        assert!(StopRepo::get(&conn, &task.id).unwrap().is_none());
    }

    #[test]
    fn test_rollover_advances_three_cycles() {
        let engine = setup_engine();
        let seeded = seed_overdue_task(&engine, 3);
        let original_interval = seeded.end_date - seeded.start_date;

        let tasks = engine.get_tasks(&alice(), 0, 100).unwrap();
        assert_eq!(tasks.len(), 1);
        let rolled = &tasks[0];

        assert_eq!(rolled.start_date, seeded.start_date + original_interval * 3);
        assert_eq!(rolled.end_date, seeded.end_date + original_interval * 3);
        assert!(rolled.end_date > Utc::now());
        assert_eq!(rolled.status, TaskStatus::InProgress);
        assert!((rolled.done_hr - 0.0).abs() < f64::EPSILON);

        let history = engine.get_progress(&seeded.id, &alice(), 0, 100).unwrap();
        assert_eq!(history.len(), 3);
        // Snapshots cover consecutive cycles
        assert_eq!(history[0].start_date, seeded.start_date);
        assert_eq!(history[1].start_date, seeded.end_date);
        assert_eq!(history[2].end_date, rolled.start_date);
    }

    #[test]
    fn test_rollover_persists_once() {
        let engine = setup_engine();
        let seeded = seed_overdue_task(&engine, 3);

        engine.get_tasks(&alice(), 0, 100).unwrap();
        // A second listing finds the task current and does nothing
        engine.get_tasks(&alice(), 0, 100).unwrap();
        let history = engine.get_progress(&seeded.id, &alice(), 0, 100).unwrap();
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_rollover_skips_stopped_and_non_repetitive() {
        let engine = setup_engine();
        let seeded = seed_overdue_task(&engine, 3);
        {
            let conn = engine.pool.get().unwrap();
            TaskRepo::set_stop_state(&conn, &seeded.id, true, None).unwrap();
        }

        let tasks = engine.get_tasks(&alice(), 0, 100).unwrap();
        assert_eq!(tasks[0].start_date, seeded.start_date);
        assert!(engine
            .get_progress(&seeded.id, &alice(), 0, 100)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rollover_cap_bounds_neglected_task() {
        let engine = setup_engine();
        // One-hour cycles, last touched half a year ago: thousands overdue
        let conn = engine.pool.get().unwrap();
        let end = Utc::now() - Duration::days(180);
        let params = TaskCreateParams {
            description: "hourly check".to_string(),
            start_date: None,
            end_date: end,
            estimated_hr: 0.5,
            is_repetitive: true,
            main_task_id: None,
        };
        let seeded =
            TaskRepo::create_task(&conn, &params, end - Duration::hours(1), "alice").unwrap();
        drop(conn);

        let tasks = engine.get_tasks(&alice(), 0, 100).unwrap();
        let history = engine.get_progress(&seeded.id, &alice(), 0, 1000).unwrap();
        assert_eq!(history.len(), 100);
        // The task row still advanced by the capped amount
        assert_eq!(
            tasks[0].start_date,
            seeded.start_date + Duration::hours(100)
        );
    }

    #[test]
    fn test_rollover_zero_length_cycle_breaks() {
        let engine = setup_engine();
        let conn = engine.pool.get().unwrap();
        let moment = Utc::now() - Duration::days(1);
        let params = TaskCreateParams {
            description: "degenerate".to_string(),
            start_date: None,
            end_date: moment,
            estimated_hr: 1.0,
            is_repetitive: true,
            main_task_id: None,
        };
        let seeded = TaskRepo::create_task(&conn, &params, moment, "alice").unwrap();
        drop(conn);

        let tasks = engine.get_tasks(&alice(), 0, 100).unwrap();
        assert_eq!(tasks[0].start_date, seeded.start_date);
        assert_eq!(tasks[0].end_date, seeded.end_date);
        // No snapshot, no advance: the task can never catch up, so the
        // listing records nothing for it
        let history = engine.get_progress(&seeded.id, &alice(), 0, 100).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_repeated_listings_do_not_grow_history() {
        let engine = setup_engine();
        // Engine-created repetitive task whose cycle collapses to an
        // instant: start defaults to now, end equals it
        let now = Utc::now() + Duration::milliseconds(200);
        let params = TaskCreateParams {
            description: "instant cycle".to_string(),
            start_date: Some(now),
            end_date: now,
            estimated_hr: 1.0,
            is_repetitive: true,
            main_task_id: None,
        };
        let task = engine.create_task(&params, &alice()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(250));
        for _ in 0..5 {
            engine.get_tasks(&alice(), 0, 100).unwrap();
        }
        let history = engine.get_progress(&task.id, &alice(), 0, 100).unwrap();
        assert!(
            history.is_empty(),
            "listing must stay read-only for a degenerate cycle, got {} snapshots",
            history.len()
        );
    }

    #[test]
    fn test_get_progress_requires_access() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        assert_matches!(
            engine.get_progress(&task.id, &bob(), 0, 10),
            Err(EngineError::Permission(_))
        );
    }

    #[test]
    fn test_get_task_analytics_smoke() {
        let engine = setup_engine();
        let task = engine.create_task(&params_for("t"), &alice()).unwrap();
        let report = engine.get_task_analytics(&task.id, &alice()).unwrap();
        assert!((report.completion.completion_rate - 0.0).abs() < f64::EPSILON);
        assert!((report.completion.remaining_hours - 4.0).abs() < f64::EPSILON);
    }
}
