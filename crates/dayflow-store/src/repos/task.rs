//! SQL data access for tasks and assignments.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use dayflow_core::EngineError;

use super::generate_id;
use crate::types::{Task, TaskCreateParams, TaskPatch, TaskStatus};

/// Task repository for SQL CRUD operations.
pub struct TaskRepo;

impl TaskRepo {
    /// Create a new task. `start_date` must already be resolved (the
    /// engine defaults it to now); new tasks always begin pending with
    /// zero done hours.
    pub fn create_task(
        conn: &Connection,
        task: &TaskCreateParams,
        start_date: DateTime<Utc>,
        owner_id: &str,
    ) -> Result<Task, EngineError> {
        let id = generate_id("task");
        let now = Utc::now();

        let _ = conn.execute(
            "INSERT INTO tasks (id, description, start_date, end_date, estimated_hr,
             done_hr, status, is_repetitive, is_stopped, main_task_id, owner_id,
             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 'pending', ?6, 0, ?7, ?8, ?9, ?9)",
            params![
                id,
                task.description,
                start_date,
                task.end_date,
                task.estimated_hr,
                task.is_repetitive,
                task.main_task_id,
                owner_id,
                now,
            ],
        )?;

        Self::get_task(conn, &id)?.ok_or_else(|| EngineError::task_not_found(&id))
    }

    /// Get a task by ID, with subtask and assignee ID lists populated.
    pub fn get_task(conn: &Connection, id: &str) -> Result<Option<Task>, EngineError> {
        let task = conn
            .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], |row| {
                Ok(task_from_row(row))
            })
            .optional()?;
        match task {
            Some(task) => Ok(Some(Self::with_relations(conn, task)?)),
            None => Ok(None),
        }
    }

    /// List a page of tasks in creation order, relations populated.
    pub fn list_tasks(
        conn: &Connection,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Task>, EngineError> {
        let mut stmt =
            conn.prepare("SELECT * FROM tasks ORDER BY created_at, id LIMIT ?1 OFFSET ?2")?;
        let tasks: Vec<Task> = stmt
            .query_map(params![limit, skip], |row| Ok(task_from_row(row)))?
            .filter_map(Result::ok)
            .collect();

        tasks
            .into_iter()
            .map(|t| Self::with_relations(conn, t))
            .collect()
    }

    /// Apply a patch. Returns the updated task, or `None` if not found.
    pub fn update_task(
        conn: &Connection,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, EngineError> {
        // Build dynamic SET clause
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref desc) = patch.description {
            sets.push("description = ?".to_string());
            values.push(Box::new(desc.clone()));
        }
        if let Some(start) = patch.start_date {
            sets.push("start_date = ?".to_string());
            values.push(Box::new(start));
        }
        if let Some(end) = patch.end_date {
            sets.push("end_date = ?".to_string());
            values.push(Box::new(end));
        }
        if let Some(est) = patch.estimated_hr {
            sets.push("estimated_hr = ?".to_string());
            values.push(Box::new(est));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?".to_string());
            values.push(Box::new(status.as_sql().to_string()));
        }
        if let Some(rep) = patch.is_repetitive {
            sets.push("is_repetitive = ?".to_string());
            values.push(Box::new(rep));
        }
        if let Some(ref parent) = patch.main_task_id {
            sets.push("main_task_id = ?".to_string());
            values.push(Box::new(parent.clone()));
        }

        if sets.is_empty() {
            return Self::get_task(conn, id);
        }

        sets.push("updated_at = ?".to_string());
        values.push(Box::new(Utc::now()));
        values.push(Box::new(id.to_string()));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let changed = conn.execute(&sql, params_refs.as_slice())?;

        if changed == 0 {
            return Ok(None);
        }
        Self::get_task(conn, id)
    }

    /// Delete a task by ID. Returns true if a row was deleted; cascades
    /// take subtasks, time logs, progress, and stop events with it.
    pub fn delete_task(conn: &Connection, id: &str) -> Result<bool, EngineError> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Record an assignment.
    pub fn add_assignee(
        conn: &Connection,
        task_id: &str,
        user_id: &str,
    ) -> Result<(), EngineError> {
        let _ = conn.execute(
            "INSERT INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
            params![task_id, user_id],
        )?;
        Ok(())
    }

    /// Persist the cycle fields after a rollover batch: start, end,
    /// status, and done hours, exactly once for the batch.
    pub fn save_cycle_state(conn: &Connection, task: &Task) -> Result<(), EngineError> {
        let _ = conn.execute(
            "UPDATE tasks SET start_date = ?1, end_date = ?2, status = ?3,
             done_hr = ?4, updated_at = ?5 WHERE id = ?6",
            params![
                task.start_date,
                task.end_date,
                task.status.as_sql(),
                task.done_hr,
                Utc::now(),
                task.id,
            ],
        )?;
        Ok(())
    }

    /// Persist accumulated done hours and a status in one step (used by
    /// the completion-propagation chain).
    pub fn set_progress_state(
        conn: &Connection,
        id: &str,
        done_hr: f64,
        status: TaskStatus,
    ) -> Result<(), EngineError> {
        let _ = conn.execute(
            "UPDATE tasks SET done_hr = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
            params![done_hr, status.as_sql(), Utc::now(), id],
        )?;
        Ok(())
    }

    /// Flip the stopped flag, optionally moving the cycle start (resume
    /// restarts the cycle clock).
    pub fn set_stop_state(
        conn: &Connection,
        id: &str,
        is_stopped: bool,
        start_date: Option<DateTime<Utc>>,
    ) -> Result<(), EngineError> {
        match start_date {
            Some(start) => {
                let _ = conn.execute(
                    "UPDATE tasks SET is_stopped = ?1, start_date = ?2, updated_at = ?3 \
                     WHERE id = ?4",
                    params![is_stopped, start, Utc::now(), id],
                )?;
            }
            None => {
                let _ = conn.execute(
                    "UPDATE tasks SET is_stopped = ?1, updated_at = ?2 WHERE id = ?3",
                    params![is_stopped, Utc::now(), id],
                )?;
            }
        }
        Ok(())
    }

    /// Whether re-parenting `task_id` under `new_parent_id` would close a
    /// cycle: walks the parent chain upward until the root (bounded by a
    /// visited set, so a corrupt chain cannot spin).
    pub fn would_create_cycle(
        conn: &Connection,
        task_id: &str,
        new_parent_id: &str,
    ) -> Result<bool, EngineError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = Some(new_parent_id.to_string());

        while let Some(id) = current {
            if id == task_id {
                return Ok(true);
            }
            if !visited.insert(id.clone()) {
                // Chain already contains a cycle not involving task_id
                return Ok(true);
            }
            current = conn
                .query_row(
                    "SELECT main_task_id FROM tasks WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
        }
        Ok(false)
    }

    fn with_relations(conn: &Connection, mut task: Task) -> Result<Task, EngineError> {
        task.subtasks = Self::subtask_ids(conn, &task.id)?;
        task.assignees = Self::assignee_ids(conn, &task.id)?;
        Ok(task)
    }

    fn subtask_ids(conn: &Connection, task_id: &str) -> Result<Vec<String>, EngineError> {
        let mut stmt =
            conn.prepare("SELECT id FROM tasks WHERE main_task_id = ?1 ORDER BY created_at")?;
        let ids = stmt
            .query_map(params![task_id], |row| row.get(0))?
            .filter_map(Result::ok)
            .collect();
        Ok(ids)
    }

    fn assignee_ids(conn: &Connection, task_id: &str) -> Result<Vec<String>, EngineError> {
        let mut stmt = conn
            .prepare("SELECT user_id FROM task_assignees WHERE task_id = ?1 ORDER BY user_id")?;
        let ids = stmt
            .query_map(params![task_id], |row| row.get(0))?
            .filter_map(Result::ok)
            .collect();
        Ok(ids)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row converters
// ─────────────────────────────────────────────────────────────────────────────

fn task_from_row(row: &rusqlite::Row<'_>) -> Task {
    let status: String = row.get_unwrap("status");
    Task {
        id: row.get_unwrap("id"),
        description: row.get_unwrap("description"),
        start_date: row.get_unwrap("start_date"),
        end_date: row.get_unwrap("end_date"),
        estimated_hr: row.get_unwrap("estimated_hr"),
        done_hr: row.get_unwrap("done_hr"),
        status: TaskStatus::from_sql(&status),
        is_repetitive: row.get_unwrap("is_repetitive"),
        is_stopped: row.get_unwrap("is_stopped"),
        main_task_id: row.get_unwrap("main_task_id"),
        owner_id: row.get_unwrap("owner_id"),
        subtasks: Vec::new(),
        assignees: Vec::new(),
        created_at: row.get_unwrap("created_at"),
        updated_at: row.get_unwrap("updated_at"),
    }
}
