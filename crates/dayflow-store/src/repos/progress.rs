//! SQL data access for progress snapshots and stop events.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use dayflow_core::EngineError;

use crate::types::{ProgressSnapshot, StopEvent, TaskProgress, TaskStatus};

/// Progress-snapshot repository. Snapshots are insert-only; they go away
/// only through the task-delete cascade.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Insert one snapshot.
    pub fn insert(conn: &Connection, snapshot: &ProgressSnapshot) -> Result<(), EngineError> {
        let _ = conn.execute(
            "INSERT INTO task_progress (task_id, start_date, end_date, status,
             done_hr, estimated_hr, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                snapshot.task_id,
                snapshot.start_date,
                snapshot.end_date,
                snapshot.status.as_sql(),
                snapshot.done_hr,
                snapshot.estimated_hr,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// List a page of snapshots for a task, oldest first.
    pub fn list(
        conn: &Connection,
        task_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TaskProgress>, EngineError> {
        let mut stmt = conn.prepare(
            "SELECT * FROM task_progress WHERE task_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![task_id, limit, skip], |row| {
                Ok(progress_from_row(row))
            })?
            .filter_map(Result::ok)
            .collect();
        Ok(rows)
    }

    /// Full snapshot history for a task, oldest first (analytics input).
    pub fn list_all(conn: &Connection, task_id: &str) -> Result<Vec<TaskProgress>, EngineError> {
        let mut stmt =
            conn.prepare("SELECT * FROM task_progress WHERE task_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![task_id], |row| Ok(progress_from_row(row)))?
            .filter_map(Result::ok)
            .collect();
        Ok(rows)
    }
}

/// Stop-event repository. At most one row per task.
pub struct StopRepo;

impl StopRepo {
    /// Record a pause.
    pub fn create(
        conn: &Connection,
        task_id: &str,
        stopped_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let _ = conn.execute(
            "INSERT INTO stop_events (task_id, stopped_at) VALUES (?1, ?2)",
            params![task_id, stopped_at],
        )?;
        Ok(())
    }

    /// Fetch the pause marker for a task, if any.
    pub fn get(conn: &Connection, task_id: &str) -> Result<Option<StopEvent>, EngineError> {
        let event = conn
            .query_row(
                "SELECT task_id, stopped_at FROM stop_events WHERE task_id = ?1",
                params![task_id],
                |row| {
                    Ok(StopEvent {
                        task_id: row.get_unwrap(0),
                        stopped_at: row.get_unwrap(1),
                    })
                },
            )
            .optional()?;
        Ok(event)
    }

    /// Consume the pause marker. Returns true if one existed.
    pub fn delete(conn: &Connection, task_id: &str) -> Result<bool, EngineError> {
        let changed = conn.execute(
            "DELETE FROM stop_events WHERE task_id = ?1",
            params![task_id],
        )?;
        Ok(changed > 0)
    }
}

fn progress_from_row(row: &rusqlite::Row<'_>) -> TaskProgress {
    let status: String = row.get_unwrap("status");
    TaskProgress {
        id: row.get_unwrap("id"),
        task_id: row.get_unwrap("task_id"),
        start_date: row.get_unwrap("start_date"),
        end_date: row.get_unwrap("end_date"),
        status: TaskStatus::from_sql(&status),
        done_hr: row.get_unwrap("done_hr"),
        estimated_hr: row.get_unwrap("estimated_hr"),
        recorded_at: row.get_unwrap("recorded_at"),
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::repos::TaskRepo;
    use crate::types::TaskCreateParams;
    use chrono::Duration;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn make_task(conn: &Connection) -> String {
        let params = TaskCreateParams {
            description: "t".to_string(),
            start_date: None,
            end_date: Utc::now() + Duration::days(1),
            estimated_hr: 4.0,
            is_repetitive: true,
            main_task_id: None,
        };
        TaskRepo::create_task(conn, &params, Utc::now(), "u1").unwrap().id
    }

    fn snapshot_for(task_id: &str, done_hr: f64) -> ProgressSnapshot {
        ProgressSnapshot {
            task_id: task_id.to_string(),
            start_date: Utc::now() - Duration::days(1),
            end_date: Utc::now(),
            status: TaskStatus::InProgress,
            done_hr,
            estimated_hr: 4.0,
        }
    }

    #[test]
    fn test_insert_and_list_ordered() {
        let conn = setup_db();
        let task_id = make_task(&conn);
        for i in 0..3 {
            ProgressRepo::insert(&conn, &snapshot_for(&task_id, f64::from(i))).unwrap();
        }
        let all = ProgressRepo::list_all(&conn, &task_id).unwrap();
        assert_eq!(all.len(), 3);
        assert!((all[0].done_hr - 0.0).abs() < f64::EPSILON);
        assert!((all[2].done_hr - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_list_pagination() {
        let conn = setup_db();
        let task_id = make_task(&conn);
        for i in 0..5 {
            ProgressRepo::insert(&conn, &snapshot_for(&task_id, f64::from(i))).unwrap();
        }
        let page = ProgressRepo::list(&conn, &task_id, 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert!((page[0].done_hr - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stop_event_lifecycle() {
        let conn = setup_db();
        let task_id = make_task(&conn);
        assert!(StopRepo::get(&conn, &task_id).unwrap().is_none());

        let stopped_at = Utc::now();
        StopRepo::create(&conn, &task_id, stopped_at).unwrap();
        let event = StopRepo::get(&conn, &task_id).unwrap().unwrap();
        assert_eq!(event.task_id, task_id);
        assert_eq!(event.stopped_at, stopped_at);

        assert!(StopRepo::delete(&conn, &task_id).unwrap());
        assert!(!StopRepo::delete(&conn, &task_id).unwrap());
    }

    #[test]
    fn test_duplicate_stop_event_rejected() {
        let conn = setup_db();
        let task_id = make_task(&conn);
        StopRepo::create(&conn, &task_id, Utc::now()).unwrap();
        assert!(StopRepo::create(&conn, &task_id, Utc::now()).is_err());
    }
}
