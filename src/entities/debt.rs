// 📉 Debt Entity - structured debts with an amortization running total
//
// `paid_amount` grows only through explicit payment confirmation or an
// at-inception-settled down payment; `total_amount` can be rewritten when a
// payment plan is (re)generated with an overridden installment amount.

use crate::db::date_to_sql;
use crate::error::{ReferenceError, Result, ValidationError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

pub const DEBT_STATUS_ACTIVE: &str = "Ativa";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub name: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub due_reference: Option<NaiveDate>,
    pub responsible: Option<String>,
    /// "À Vista" / "Parcelado"; `None` until a payment plan exists.
    pub payment_form: Option<String>,
    pub installment_count: i64,
    pub status: String,
}

impl Debt {
    pub fn remaining(&self) -> f64 {
        (self.total_amount - self.paid_amount).max(0.0)
    }

    /// Fraction amortized so far, capped at 1.0.
    pub fn progress(&self) -> f64 {
        if self.total_amount > 0.0 {
            (self.paid_amount / self.total_amount).min(1.0)
        } else {
            0.0
        }
    }

    pub fn is_settled(&self) -> bool {
        self.paid_amount >= self.total_amount
    }
}

/// Input for registering a debt. Registration creates the debt row only;
/// ledger entries appear when a payment plan is generated.
#[derive(Debug, Clone)]
pub struct DebtDraft {
    pub name: String,
    pub total_amount: f64,
    pub due_reference: Option<NaiveDate>,
    pub responsible: Option<String>,
}

pub fn register_debt(conn: &Connection, draft: &DebtDraft) -> Result<Debt> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    if draft.total_amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(draft.total_amount).into());
    }

    conn.execute(
        "INSERT INTO debts (name, total_amount, paid_amount, due_reference, responsible, payment_form, installment_count, status)
         VALUES (?1, ?2, 0, ?3, ?4, NULL, 1, ?5)",
        params![
            draft.name.trim(),
            draft.total_amount,
            draft.due_reference.map(date_to_sql),
            draft.responsible,
            DEBT_STATUS_ACTIVE,
        ],
    )?;

    Ok(Debt {
        id: conn.last_insert_rowid(),
        name: draft.name.trim().to_string(),
        total_amount: draft.total_amount,
        paid_amount: 0.0,
        due_reference: draft.due_reference,
        responsible: draft.responsible.clone(),
        payment_form: None,
        installment_count: 1,
        status: DEBT_STATUS_ACTIVE.to_string(),
    })
}

fn map_debt(row: &rusqlite::Row<'_>) -> rusqlite::Result<Debt> {
    let due_str: Option<String> = row.get(4)?;
    Ok(Debt {
        id: row.get(0)?,
        name: row.get(1)?,
        total_amount: row.get(2)?,
        paid_amount: row.get(3)?,
        due_reference: due_str.as_deref().map(crate::db::date_from_sql),
        responsible: row.get(5)?,
        payment_form: row.get(6)?,
        installment_count: row.get(7)?,
        status: row.get(8)?,
    })
}

const DEBT_COLUMNS: &str =
    "id, name, total_amount, paid_amount, due_reference, responsible, payment_form, installment_count, status";

pub fn find_debt(conn: &Connection, id: i64) -> Result<Debt> {
    let sql = format!("SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1");
    conn.query_row(&sql, params![id], map_debt)
        .optional()?
        .ok_or_else(|| ReferenceError::DebtNotFound(id).into())
}

pub fn find_debt_by_name(conn: &Connection, name: &str) -> Result<Option<Debt>> {
    let sql = format!("SELECT {DEBT_COLUMNS} FROM debts WHERE name = ?1");
    let debt = conn.query_row(&sql, params![name], map_debt).optional()?;
    Ok(debt)
}

pub fn list_active_debts(conn: &Connection) -> Result<Vec<Debt>> {
    let sql = format!("SELECT {DEBT_COLUMNS} FROM debts WHERE status = ?1 ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let debts = stmt
        .query_map(params![DEBT_STATUS_ACTIVE], map_debt)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(debts)
}

/// Accumulate a confirmed payment into `paid_amount`. Returns rows touched.
pub fn add_payment(conn: &Connection, id: i64, amount: f64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE debts SET paid_amount = paid_amount + ?1 WHERE id = ?2",
        params![amount, id],
    )?;
    Ok(changed)
}
