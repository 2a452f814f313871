//! SQL DDL for the dayflow tables.
//!
//! Creates `tasks`, `task_assignees`, `task_progress`, `stop_events`,
//! `day_plans`, and `time_logs`. Foreign keys cascade so that deleting a
//! task removes its subtasks, time logs, progress snapshots, and stop
//! event, and deleting a day plan removes its time logs.

use rusqlite::Connection;

use dayflow_core::EngineError;

/// Run all migrations.
///
/// Idempotent — safe to call multiple times (uses `IF NOT EXISTS`).
pub fn run_migrations(conn: &Connection) -> Result<(), EngineError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Combined DDL for all dayflow tables.
const SCHEMA: &str = r"
-- Tasks table (self-referencing tree via main_task_id)
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    estimated_hr REAL NOT NULL DEFAULT 0,
    done_hr REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK(status IN ('pending', 'in_progress', 'completed', 'stopped')),
    is_repetitive INTEGER NOT NULL DEFAULT 0,
    is_stopped INTEGER NOT NULL DEFAULT 0,
    main_task_id TEXT REFERENCES tasks(id) ON DELETE CASCADE,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK(done_hr >= 0)
);

CREATE INDEX IF NOT EXISTS idx_tasks_owner
    ON tasks(owner_id);
CREATE INDEX IF NOT EXISTS idx_tasks_main_task
    ON tasks(main_task_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status
    ON tasks(status);

-- Task assignees (many-to-many, user side lives outside this core)
CREATE TABLE IF NOT EXISTS task_assignees (
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (task_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_task_assignees_user
    ON task_assignees(user_id);

-- Immutable per-cycle progress snapshots
CREATE TABLE IF NOT EXISTS task_progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    done_hr REAL NOT NULL,
    estimated_hr REAL NOT NULL,
    recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_task_progress_task
    ON task_progress(task_id, id);

-- Stop events: at most one per task, present only while paused
CREATE TABLE IF NOT EXISTS stop_events (
    task_id TEXT PRIMARY KEY REFERENCES tasks(id) ON DELETE CASCADE,
    stopped_at TEXT NOT NULL
);

-- Day plans: one per user per date
CREATE TABLE IF NOT EXISTS day_plans (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(date, user_id)
);

-- Time logs, attached to a plan and a task
CREATE TABLE IF NOT EXISTS time_logs (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    plan_id TEXT NOT NULL REFERENCES day_plans(id) ON DELETE CASCADE,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK(start_time < end_time)
);

CREATE INDEX IF NOT EXISTS idx_time_logs_plan
    ON time_logs(plan_id, start_time);
CREATE INDEX IF NOT EXISTS idx_time_logs_task
    ON time_logs(task_id);
";
