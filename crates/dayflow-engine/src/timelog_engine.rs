//! Day-plan and time-log engine.
//!
//! Time logs are half-open intervals `[start, end)` attached to a day
//! plan. Within one plan no two logs may overlap; touching endpoints are
//! fine. Marking a log done credits its duration to the task and walks
//! the completion chain upward (see [`TimeLogEngine::mark_time_log_done`]).

use chrono::NaiveDate;
use tracing::debug;

use dayflow_core::{EngineError, Principal};
use dayflow_store::ConnectionPool;
use dayflow_store::repos::{PlanRepo, TaskRepo, TimeLogRepo};
use dayflow_store::types::{DayPlanWithLogs, TaskStatus, TimeLog, TimeLogCreateParams};

use crate::uow::with_uow;

/// Engine for day plans and time logs.
#[derive(Clone)]
pub struct TimeLogEngine {
    pool: ConnectionPool,
}

impl TimeLogEngine {
    /// Create a time-log engine over a connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Get the principal's plan for a date, creating it when absent.
    pub fn get_day_plan(
        &self,
        date: NaiveDate,
        principal: &Principal,
    ) -> Result<DayPlanWithLogs, EngineError> {
        with_uow(&self.pool, |tx| {
            let plan = match PlanRepo::get_by_date(tx, date, &principal.id)? {
                Some(plan) => plan,
                None => {
                    debug!(%date, user = %principal.id, "creating day plan");
                    PlanRepo::create(tx, date, &principal.id)?
                }
            };
            let time_logs = TimeLogRepo::list_for_plan(tx, &plan.id)?;
            Ok(DayPlanWithLogs { plan, time_logs })
        })
    }

    /// Delete the principal's plan for a date. Returns whether one
    /// existed; its logs cascade away with it.
    pub fn delete_day_plan(
        &self,
        date: NaiveDate,
        principal: &Principal,
    ) -> Result<bool, EngineError> {
        with_uow(&self.pool, |tx| PlanRepo::delete_by_date(tx, date, &principal.id))
    }

    /// Log a work interval against a task on a plan. Both the plan and
    /// the task must belong to the caller.
    ///
    /// The overlap check and the insert share one transaction, so two
    /// concurrent callers cannot both slip an overlapping log in. Logging
    /// against a pending task moves it to in-progress.
    pub fn create_time_log(
        &self,
        input: &TimeLogCreateParams,
        principal: &Principal,
    ) -> Result<TimeLog, EngineError> {
        with_uow(&self.pool, |tx| {
            if input.start_time >= input.end_time {
                return Err(EngineError::bad_request("Start time must be before end time"));
            }

            let plan = PlanRepo::get_by_id(tx, &input.plan_id)?
                .ok_or_else(|| EngineError::plan_not_found(&input.plan_id))?;
            if plan.user_id != principal.id {
                return Err(EngineError::permission(
                    "Cannot log time on another user's day plan",
                ));
            }
            for existing in TimeLogRepo::list_for_plan(tx, &plan.id)? {
                if input.start_time < existing.end_time && existing.start_time < input.end_time {
                    return Err(EngineError::bad_request(
                        "Time log overlaps an existing time log on this plan",
                    ));
                }
            }

            let task = TaskRepo::get_task(tx, &input.task_id)?
                .ok_or_else(|| EngineError::task_not_found(&input.task_id))?;
            if task.owner_id != principal.id {
                return Err(EngineError::permission(
                    "Only the task owner can log time against it",
                ));
            }
            if task.status == TaskStatus::Pending {
                TaskRepo::set_progress_state(tx, &task.id, task.done_hr, TaskStatus::InProgress)?;
            }

            let log = TimeLogRepo::create(tx, input)?;
            debug!(log_id = %log.id, task_id = %log.task_id, "time log created");
            Ok(log)
        })
    }

    /// Delete a time log. Only the owner of the log's task may.
    pub fn delete_time_log(
        &self,
        id: &str,
        principal: &Principal,
    ) -> Result<TimeLog, EngineError> {
        with_uow(&self.pool, |tx| {
            let log = TimeLogRepo::get(tx, id)?
                .ok_or_else(|| EngineError::time_log_not_found(id))?;
            let task = TaskRepo::get_task(tx, &log.task_id)?
                .ok_or_else(|| EngineError::task_not_found(&log.task_id))?;
            if task.owner_id != principal.id {
                return Err(EngineError::permission(
                    "Only the task owner can delete this time log",
                ));
            }
            let _ = TimeLogRepo::delete(tx, id)?;
            Ok(log)
        })
    }

    /// Mark a log done and credit its duration to the task.
    ///
    /// When the credited task reaches its estimate it completes, and the
    /// completed task's estimate rolls up to its parent; the walk repeats
    /// until a task stays below its estimate or the chain tops out. The
    /// first below-threshold task still gets its accumulated hours
    /// persisted (and pending tasks move to in-progress there).
    pub fn mark_time_log_done(
        &self,
        id: &str,
        principal: &Principal,
    ) -> Result<TimeLog, EngineError> {
        with_uow(&self.pool, |tx| {
            let log = TimeLogRepo::get(tx, id)?
                .ok_or_else(|| EngineError::time_log_not_found(id))?;
            let mut task = TaskRepo::get_task(tx, &log.task_id)?
                .ok_or_else(|| EngineError::task_not_found(&log.task_id))?;
            if task.owner_id != principal.id {
                return Err(EngineError::permission(
                    "Only the task owner can mark this time log done",
                ));
            }
            if log.done {
                return Err(EngineError::bad_request("Time log is already marked done"));
            }

            TimeLogRepo::mark_done(tx, id)?;
            task.done_hr += duration_hours(&log);

            loop {
                if task.done_hr >= task.estimated_hr {
                    TaskRepo::set_progress_state(
                        tx,
                        &task.id,
                        task.done_hr,
                        TaskStatus::Completed,
                    )?;
                    debug!(task_id = %task.id, "task completed");
                    let Some(parent_id) = task.main_task_id.clone() else {
                        break;
                    };
                    let credit = task.estimated_hr;
                    task = TaskRepo::get_task(tx, &parent_id)?
                        .ok_or_else(|| EngineError::task_not_found(&parent_id))?;
                    task.done_hr += credit;
                } else {
                    let status = if task.status == TaskStatus::Pending {
                        TaskStatus::InProgress
                    } else {
                        task.status
                    };
                    TaskRepo::set_progress_state(tx, &task.id, task.done_hr, status)?;
                    break;
                }
            }

            TimeLogRepo::get(tx, id)?.ok_or_else(|| EngineError::time_log_not_found(id))
        })
    }
}

/// Interval length in hours, rounded to two decimals.
fn duration_hours(log: &TimeLog) -> f64 {
    let seconds = (log.end_time - log.start_time).num_seconds();
    #[allow(clippy::cast_precision_loss)]
    let hours = seconds as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
