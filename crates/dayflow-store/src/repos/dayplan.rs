//! SQL data access for day plans.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

use dayflow_core::EngineError;

use super::generate_id;
use crate::types::DayPlan;

/// Day-plan repository. One plan per user per date (enforced by a UNIQUE
/// constraint).
pub struct PlanRepo;

impl PlanRepo {
    /// Create a plan for a user and date.
    pub fn create(
        conn: &Connection,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<DayPlan, EngineError> {
        let id = generate_id("plan");
        let _ = conn.execute(
            "INSERT INTO day_plans (id, date, user_id) VALUES (?1, ?2, ?3)",
            params![id, date, user_id],
        )?;
        Ok(DayPlan {
            id,
            date,
            user_id: user_id.to_string(),
        })
    }

    /// Get a user's plan for a date.
    pub fn get_by_date(
        conn: &Connection,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<Option<DayPlan>, EngineError> {
        let plan = conn
            .query_row(
                "SELECT id, date, user_id FROM day_plans WHERE date = ?1 AND user_id = ?2",
                params![date, user_id],
                |row| Ok(plan_from_row(row)),
            )
            .optional()?;
        Ok(plan)
    }

    /// Get a plan by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<DayPlan>, EngineError> {
        let plan = conn
            .query_row(
                "SELECT id, date, user_id FROM day_plans WHERE id = ?1",
                params![id],
                |row| Ok(plan_from_row(row)),
            )
            .optional()?;
        Ok(plan)
    }

    /// Delete a user's plan for a date. Returns true if a row was
    /// deleted; the cascade removes its time logs.
    pub fn delete_by_date(
        conn: &Connection,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<bool, EngineError> {
        let changed = conn.execute(
            "DELETE FROM day_plans WHERE date = ?1 AND user_id = ?2",
            params![date, user_id],
        )?;
        Ok(changed > 0)
    }
}

fn plan_from_row(row: &rusqlite::Row<'_>) -> DayPlan {
    DayPlan {
        id: row.get_unwrap(0),
        date: row.get_unwrap(1),
        user_id: row.get_unwrap(2),
    }
}
