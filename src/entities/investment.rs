// 📈 Investment Entities - asset types and their accumulated positions
//
// One position row per asset type. `accumulated` grows with contribution
// ledger entries and shrinks when one is deleted (reversal). Creating an
// asset type seeds its position at zero, so contributions never target a
// missing row.

use crate::error::{ReferenceError, Result, ValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetType {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentPosition {
    pub id: i64,
    pub asset_type_id: i64,
    pub accumulated: f64,
}

pub fn create_asset_type(conn: &Connection, name: &str, color: &str) -> Result<AssetType> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }

    conn.execute(
        "INSERT INTO asset_types (name, color) VALUES (?1, ?2)",
        params![name.trim(), color],
    )?;
    let id = conn.last_insert_rowid();

    // Seed the position so contributions always have a target row.
    conn.execute(
        "INSERT INTO investment_positions (asset_type_id, accumulated) VALUES (?1, 0)",
        params![id],
    )?;

    Ok(AssetType {
        id,
        name: name.trim().to_string(),
        color: color.to_string(),
    })
}

pub fn find_asset_type(conn: &Connection, id: i64) -> Result<AssetType> {
    conn.query_row(
        "SELECT id, name, color FROM asset_types WHERE id = ?1",
        params![id],
        |row| {
            Ok(AssetType {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| ReferenceError::AssetTypeNotFound(id).into())
}

pub fn find_asset_type_by_name(conn: &Connection, name: &str) -> Result<Option<AssetType>> {
    let asset = conn
        .query_row(
            "SELECT id, name, color FROM asset_types WHERE name = ?1",
            params![name],
            |row| {
                Ok(AssetType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(asset)
}

pub fn list_asset_types(conn: &Connection) -> Result<Vec<AssetType>> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM asset_types ORDER BY name")?;
    let assets = stmt
        .query_map([], |row| {
            Ok(AssetType {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(assets)
}

pub fn position_for(conn: &Connection, asset_type_id: i64) -> Result<Option<InvestmentPosition>> {
    let position = conn
        .query_row(
            "SELECT id, asset_type_id, accumulated FROM investment_positions WHERE asset_type_id = ?1",
            params![asset_type_id],
            |row| {
                Ok(InvestmentPosition {
                    id: row.get(0)?,
                    asset_type_id: row.get(1)?,
                    accumulated: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(position)
}

/// Apply a contribution (positive) or a reversal (negative) to the position.
/// Returns the number of rows touched.
pub fn adjust_position(conn: &Connection, asset_type_id: i64, delta: f64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE investment_positions SET accumulated = accumulated + ?1 WHERE asset_type_id = ?2",
        params![delta, asset_type_id],
    )?;
    Ok(changed)
}

pub fn total_patrimony(conn: &Connection) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT IFNULL(SUM(accumulated), 0) FROM investment_positions",
        [],
        |row| row.get(0),
    )?;
    Ok(total)
}

// ============================================================================
// ALLOCATION (read-side roll-up)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub asset: String,
    pub color: String,
    pub accumulated: f64,
    /// Share of the total patrimony, 0.0 when the portfolio is empty.
    pub share: f64,
}

pub fn allocation(conn: &Connection) -> Result<Vec<Allocation>> {
    let total = total_patrimony(conn)?;

    let mut stmt = conn.prepare(
        "SELECT t.name, t.color, p.accumulated
         FROM investment_positions p
         JOIN asset_types t ON p.asset_type_id = t.id
         ORDER BY p.accumulated DESC, t.name",
    )?;

    let allocations = stmt
        .query_map([], |row| {
            let accumulated: f64 = row.get(2)?;
            Ok(Allocation {
                asset: row.get(0)?,
                color: row.get(1)?,
                accumulated,
                share: if total > 0.0 { accumulated / total } else { 0.0 },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(allocations)
}
