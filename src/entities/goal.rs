// 🎯 Goal Entity - savings goals with a derived running total
//
// `current_amount` is a running total fed exclusively by goal-contribution
// ledger entries (and reversed when one is deleted). It is never recomputed
// from scratch.

use crate::error::{ReferenceError, Result, ValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub icon: String,
}

impl Goal {
    /// Fraction saved so far, capped at 1.0.
    pub fn progress(&self) -> f64 {
        if self.target_amount > 0.0 {
            (self.current_amount / self.target_amount).min(1.0)
        } else {
            0.0
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

pub fn create_goal(conn: &Connection, name: &str, target_amount: f64, icon: &str) -> Result<Goal> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    if target_amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(target_amount).into());
    }

    conn.execute(
        "INSERT INTO goals (name, target_amount, current_amount, icon) VALUES (?1, ?2, 0, ?3)",
        params![name.trim(), target_amount, icon],
    )?;

    Ok(Goal {
        id: conn.last_insert_rowid(),
        name: name.trim().to_string(),
        target_amount,
        current_amount: 0.0,
        icon: icon.to_string(),
    })
}

fn map_goal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        current_amount: row.get(3)?,
        icon: row.get(4)?,
    })
}

pub fn find_goal(conn: &Connection, id: i64) -> Result<Goal> {
    conn.query_row(
        "SELECT id, name, target_amount, current_amount, icon FROM goals WHERE id = ?1",
        params![id],
        map_goal,
    )
    .optional()?
    .ok_or_else(|| ReferenceError::GoalNotFound(id).into())
}

pub fn find_goal_by_name(conn: &Connection, name: &str) -> Result<Option<Goal>> {
    let goal = conn
        .query_row(
            "SELECT id, name, target_amount, current_amount, icon FROM goals WHERE name = ?1",
            params![name],
            map_goal,
        )
        .optional()?;
    Ok(goal)
}

pub fn list_goals(conn: &Connection) -> Result<Vec<Goal>> {
    let mut stmt =
        conn.prepare("SELECT id, name, target_amount, current_amount, icon FROM goals ORDER BY name")?;
    let goals = stmt
        .query_map([], map_goal)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(goals)
}

/// Apply a contribution (positive) or a reversal (negative) to the running
/// total. Returns the number of rows touched so callers can detect a
/// vanished goal.
pub fn adjust_goal(conn: &Connection, id: i64, delta: f64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE goals SET current_amount = current_amount + ?1 WHERE id = ?2",
        params![delta, id],
    )?;
    Ok(changed)
}

pub fn delete_goal(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM goals WHERE id = ?1", params![id])?;
    Ok(())
}

// ============================================================================
// OVERVIEW (read-side roll-up)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GoalOverview {
    pub total_target: f64,
    pub total_saved: f64,
    pub total_missing: f64,
    pub overall_progress: f64,
}

pub fn goal_overview(conn: &Connection) -> Result<GoalOverview> {
    let (total_target, total_saved): (f64, f64) = conn.query_row(
        "SELECT IFNULL(SUM(target_amount), 0), IFNULL(SUM(current_amount), 0) FROM goals",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(GoalOverview {
        total_target,
        total_saved,
        total_missing: (total_target - total_saved).max(0.0),
        overall_progress: if total_target > 0.0 {
            total_saved / total_target
        } else {
            0.0
        },
    })
}
