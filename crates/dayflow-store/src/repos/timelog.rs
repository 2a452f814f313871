//! SQL data access for time logs.

use rusqlite::{Connection, OptionalExtension, params};

use dayflow_core::EngineError;

use super::generate_id;
use crate::types::{TimeLog, TimeLogCreateParams};

/// Time-log repository.
pub struct TimeLogRepo;

impl TimeLogRepo {
    /// Insert a new log. The overlap check happens in the engine, inside
    /// the same transaction as this insert.
    pub fn create(
        conn: &Connection,
        log: &TimeLogCreateParams,
    ) -> Result<TimeLog, EngineError> {
        let id = generate_id("log");
        let _ = conn.execute(
            "INSERT INTO time_logs (id, task_id, plan_id, start_time, end_time, done)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![id, log.task_id, log.plan_id, log.start_time, log.end_time],
        )?;
        Self::get(conn, &id)?.ok_or_else(|| EngineError::time_log_not_found(&id))
    }

    /// Get a log by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<TimeLog>, EngineError> {
        let log = conn
            .query_row(
                "SELECT * FROM time_logs WHERE id = ?1",
                params![id],
                |row| Ok(log_from_row(row)),
            )
            .optional()?;
        Ok(log)
    }

    /// All logs on a plan, ordered by start time.
    pub fn list_for_plan(conn: &Connection, plan_id: &str) -> Result<Vec<TimeLog>, EngineError> {
        let mut stmt =
            conn.prepare("SELECT * FROM time_logs WHERE plan_id = ?1 ORDER BY start_time")?;
        let logs = stmt
            .query_map(params![plan_id], |row| Ok(log_from_row(row)))?
            .filter_map(Result::ok)
            .collect();
        Ok(logs)
    }

    /// Delete a log by ID. Returns true if a row was deleted.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool, EngineError> {
        let changed = conn.execute("DELETE FROM time_logs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Flip `done` to true.
    pub fn mark_done(conn: &Connection, id: &str) -> Result<(), EngineError> {
        let _ = conn.execute(
            "UPDATE time_logs SET done = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}

fn log_from_row(row: &rusqlite::Row<'_>) -> TimeLog {
    TimeLog {
        id: row.get_unwrap("id"),
        task_id: row.get_unwrap("task_id"),
        plan_id: row.get_unwrap("plan_id"),
        start_time: row.get_unwrap("start_time"),
        end_time: row.get_unwrap("end_time"),
        done: row.get_unwrap("done"),
    }
}
