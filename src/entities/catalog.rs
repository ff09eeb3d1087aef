// 🗂️ Catalog - categories, accounts, responsibles
//
// Plain lookup tables with no derived state. The one behavioral rule lives
// in `expense_cost_kind`: an expense's Fixed/Variable classification comes
// from its category record at expansion time.

use crate::db::CostType;
use crate::error::{ReferenceError, Result, ValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub cost_kind: CostType,
}

pub fn add_income_category(conn: &Connection, name: &str) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    conn.execute(
        "INSERT INTO income_categories (name) VALUES (?1)",
        params![name.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// `cost_kind` must be Fixo or Variável; the other cost types are reserved
/// for goal/investment/debt entries.
pub fn add_expense_category(conn: &Connection, name: &str, cost_kind: CostType) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    debug_assert!(matches!(cost_kind, CostType::Fixo | CostType::Variavel));

    conn.execute(
        "INSERT INTO expense_categories (name, cost_kind) VALUES (?1, ?2)",
        params![name.trim(), cost_kind.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fixed/Variable lookup for the expander. Missing category is a hard
/// reference error: the legacy fallback to "Variável" hid typos.
pub fn expense_cost_kind(conn: &Connection, name: &str) -> Result<CostType> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT cost_kind FROM expense_categories WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    kind.as_deref()
        .and_then(CostType::parse)
        .ok_or_else(|| ReferenceError::CategoryNotFound(name.to_string()).into())
}

pub fn list_expense_categories(conn: &Connection) -> Result<Vec<ExpenseCategory>> {
    let mut stmt =
        conn.prepare("SELECT id, name, cost_kind FROM expense_categories ORDER BY name")?;
    let categories = stmt
        .query_map([], |row| {
            let kind: String = row.get(2)?;
            Ok(ExpenseCategory {
                id: row.get(0)?,
                name: row.get(1)?,
                cost_kind: CostType::parse(&kind).unwrap_or(CostType::Variavel),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

pub fn list_income_categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM income_categories ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

pub fn add_account(conn: &Connection, name: &str) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    conn.execute("INSERT INTO accounts (name) VALUES (?1)", params![name.trim()])?;
    Ok(conn.last_insert_rowid())
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM accounts ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

pub fn add_responsible(conn: &Connection, name: &str) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    conn.execute(
        "INSERT INTO responsibles (name) VALUES (?1)",
        params![name.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_responsibles(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM responsibles ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
