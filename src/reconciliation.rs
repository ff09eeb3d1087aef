// ⚖️ Ledger Reconciler - keep aggregates consistent under pay/edit/delete
//
// The counterpart of the expander: once entries exist, every state change
// must keep the owning aggregates honest.
//
// - confirm_payment: Pendente → Paga exactly once; debt-linked entries feed
//   the debt's paid_amount through structured linkage (never by re-parsing
//   the label). Confirming a non-pending entry is rejected.
// - edit_entry: rewrites date/description/amount; when the entry is in a
//   counted state the amount delta is applied to the owning aggregate too.
// - delete_entry: goal/investment contributions reverse their aggregate
//   exactly once. Debt entries do NOT reverse paid_amount: a confirmed
//   payment stays paid even if its ledger row is pruned.
// - delete_debt: partial cascade - pending installments vanish with the
//   debt, paid installments remain as history.

use crate::db::{self, EntryStatus, Event, GroupKind, LedgerEntry};
use crate::entities::{debt, goal, investment};
use crate::error::{ReconciliationError, Result, ValidationError};
use crate::label;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

/// Apply `delta` to the aggregate this entry points at. Hard error when the
/// target row no longer exists - the legacy best-effort swallow hid real
/// inconsistencies.
fn apply_aggregate_delta(tx: &Connection, entry: &LedgerEntry, delta: f64) -> Result<()> {
    let Some(kind) = entry.group_kind else {
        return Ok(());
    };
    let name = entry
        .group_name
        .as_deref()
        .ok_or(ReconciliationError::MissingLinkage(entry.id))?;

    let missing = || ReconciliationError::AggregateTargetMissing {
        entry_id: entry.id,
        target: name.to_string(),
    };

    match kind {
        GroupKind::Meta => {
            let target = goal::find_goal_by_name(tx, name)?.ok_or_else(missing)?;
            goal::adjust_goal(tx, target.id, delta)?;
        }
        GroupKind::Investimento => {
            let asset = investment::find_asset_type_by_name(tx, name)?.ok_or_else(missing)?;
            if investment::adjust_position(tx, asset.id, delta)? == 0 {
                return Err(missing().into());
            }
        }
        GroupKind::Divida => {
            let target = debt::find_debt_by_name(tx, name)?.ok_or_else(missing)?;
            debt::add_payment(tx, target.id, delta)?;
        }
        GroupKind::Despesa | GroupKind::Receita => {}
    }

    Ok(())
}

// ============================================================================
// PAYMENT CONFIRMATION
// ============================================================================

/// Transition a pending entry to "Paga", dating it at the payment date.
///
/// Debt-linked entries increment the owning debt's `paid_amount` by the
/// entry's amount - this is the only path (besides settled down payments) by
/// which `paid_amount` grows. The Pendente precondition makes the increment
/// apply at most once per entry.
pub fn confirm_payment(conn: &mut Connection, entry_id: i64, payment_date: NaiveDate) -> Result<()> {
    let mut entry = db::get_entry(conn, entry_id)?;

    if entry.group_kind.is_none() {
        return Err(ReconciliationError::MissingLinkage(entry_id).into());
    }
    if entry.status != EntryStatus::Pendente {
        return Err(ReconciliationError::EntryNotPending(entry_id).into());
    }

    entry.status = EntryStatus::Paga;
    entry.date = payment_date;
    entry.description = label::render(&entry);

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE ledger_entries SET status = ?1, date = ?2, description = ?3 WHERE id = ?4",
        params![
            entry.status.as_str(),
            db::date_to_sql(entry.date),
            entry.description,
            entry.id,
        ],
    )?;

    if entry.group_kind == Some(GroupKind::Divida) {
        apply_aggregate_delta(&tx, &entry, entry.amount)?;
    }

    let event = Event::new(
        "payment_confirmed",
        "ledger_entry",
        &entry.id.to_string(),
        serde_json::json!({ "amount": entry.amount, "date": db::date_to_sql(payment_date) }),
        "reconciler",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(())
}

// ============================================================================
// ENTRY EDIT
// ============================================================================

/// Overwrite date/description/amount on a single entry.
///
/// When the entry is in a counted state (goal/investment contributions
/// always; debt entries once paid), the amount delta is applied to the
/// owning aggregate in the same transaction, so the aggregate keeps matching
/// the sum of its entries.
pub fn edit_entry(
    conn: &mut Connection,
    entry_id: i64,
    new_date: NaiveDate,
    new_description: &str,
    new_amount: f64,
) -> Result<()> {
    if new_amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(new_amount).into());
    }
    if new_description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription.into());
    }

    let entry = db::get_entry(conn, entry_id)?;
    let delta = new_amount - entry.amount;

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE ledger_entries SET date = ?1, description = ?2, amount = ?3 WHERE id = ?4",
        params![
            db::date_to_sql(new_date),
            new_description.trim(),
            new_amount,
            entry.id,
        ],
    )?;

    if delta != 0.0 && entry.is_counted() {
        apply_aggregate_delta(&tx, &entry, delta)?;
    }

    let event = Event::new(
        "entry_edited",
        "ledger_entry",
        &entry.id.to_string(),
        serde_json::json!({ "old_amount": entry.amount, "new_amount": new_amount }),
        "reconciler",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(())
}

// ============================================================================
// DELETION
// ============================================================================

/// Delete one entry, reversing goal/investment contributions exactly once.
///
/// Debt-linked entries cause no aggregate change: `paid_amount` records that
/// a payment happened, and removing the ledger row does not un-pay it.
pub fn delete_entry(conn: &mut Connection, entry_id: i64) -> Result<()> {
    let entry = db::get_entry(conn, entry_id)?;

    if entry.group_kind.is_none() {
        // Pre-migration rows: refuse when the label says the row feeds an
        // aggregate; a blind delete would leak the contribution.
        let parsed = label::parse_legacy(&entry.description, entry.movement);
        if matches!(parsed.group_kind, GroupKind::Meta | GroupKind::Investimento) {
            return Err(ReconciliationError::MissingLinkage(entry_id).into());
        }
    }

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM ledger_entries WHERE id = ?1", params![entry.id])?;

    if matches!(
        entry.group_kind,
        Some(GroupKind::Meta) | Some(GroupKind::Investimento)
    ) {
        apply_aggregate_delta(&tx, &entry, -entry.amount)?;
    }

    let event = Event::new(
        "entry_deleted",
        "ledger_entry",
        &entry.id.to_string(),
        serde_json::json!({ "amount": entry.amount }),
        "reconciler",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(())
}

/// Delete a debt and its pending installments; paid installments survive as
/// historical ledger rows. Returns how many entries were removed.
pub fn delete_debt(conn: &mut Connection, debt_id: i64) -> Result<usize> {
    let target = debt::find_debt(conn, debt_id)?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM debts WHERE id = ?1", params![target.id])?;

    // Structured match for migrated rows, label match for pre-migration ones.
    let legacy_pattern = format!("Dívida: {}%", target.name);
    let removed = tx.execute(
        "DELETE FROM ledger_entries
         WHERE (group_kind = 'Dívida' AND group_name = ?1 AND status = 'Pendente')
            OR (group_kind IS NULL AND description LIKE ?2 AND description LIKE '%Pendente%')",
        params![target.name, legacy_pattern],
    )?;

    let event = Event::new(
        "debt_deleted",
        "debt",
        &target.id.to_string(),
        serde_json::json!({ "name": target.name, "entries_removed": removed }),
        "reconciler",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(removed)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{setup_database, CostType, PaymentMethod};
    use crate::entities::debt::DebtDraft;
    use crate::entities::{catalog, goal, investment};
    use crate::error::CoreError;
    use crate::expand::{
        expand_commitment, Commitment, DebtPaymentPlan, ExpenseCommitment, GoalContribution,
        InvestmentContribution, PaymentDetails,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        catalog::add_expense_category(&conn, "Alimentação", CostType::Variavel).unwrap();
        conn
    }

    fn plan_car_loan(conn: &mut Connection) -> (i64, Vec<LedgerEntry>) {
        let registered = debt::register_debt(
            conn,
            &DebtDraft {
                name: "Car Loan".to_string(),
                total_amount: 12000.0,
                due_reference: None,
                responsible: None,
            },
        )
        .unwrap();

        let entries = expand_commitment(
            conn,
            &Commitment::DebtPaymentPlan(DebtPaymentPlan {
                debt_id: registered.id,
                installments: 12,
                start_date: date(2026, 1, 10),
                installment_amount: None,
                down_payment: None,
            }),
        )
        .unwrap();

        (registered.id, entries)
    }

    #[test]
    fn test_confirm_payment_feeds_debt_exactly_once() {
        let mut conn = test_conn();
        let (debt_id, entries) = plan_car_loan(&mut conn);

        confirm_payment(&mut conn, entries[0].id, date(2026, 1, 12)).unwrap();

        let entry = db::get_entry(&conn, entries[0].id).unwrap();
        assert_eq!(entry.status, EntryStatus::Paga);
        assert_eq!(entry.date, date(2026, 1, 12));
        assert!(entry.description.ends_with("Paga"));

        let target = debt::find_debt(&conn, debt_id).unwrap();
        assert_eq!(target.paid_amount, 1000.0);

        // Second confirmation is rejected and the aggregate is untouched.
        let err = confirm_payment(&mut conn, entries[0].id, date(2026, 1, 13)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Reconciliation(ReconciliationError::EntryNotPending(_))
        ));
        let target = debt::find_debt(&conn, debt_id).unwrap();
        assert_eq!(target.paid_amount, 1000.0);
    }

    #[test]
    fn test_confirm_payment_non_debt_entry_touches_no_aggregate() {
        let mut conn = test_conn();
        let entries = expand_commitment(
            &mut conn,
            &Commitment::Expense(ExpenseCommitment {
                description: "Conta de luz".to_string(),
                category: "Alimentação".to_string(),
                amount: 180.0,
                purchase_date: date(2026, 3, 10),
                installments: 1,
                responsible: None,
                payment: PaymentDetails::Cash {
                    method: PaymentMethod::Debito,
                    pending: true,
                },
            }),
        )
        .unwrap();

        confirm_payment(&mut conn, entries[0].id, date(2026, 3, 15)).unwrap();
        let entry = db::get_entry(&conn, entries[0].id).unwrap();
        assert_eq!(entry.status, EntryStatus::Paga);
    }

    #[test]
    fn test_confirm_payment_with_vanished_debt_is_hard_error() {
        let mut conn = test_conn();
        let (_, entries) = plan_car_loan(&mut conn);

        // Simulate a debt row removed behind the reconciler's back.
        conn.execute("DELETE FROM debts", []).unwrap();

        let err = confirm_payment(&mut conn, entries[0].id, date(2026, 1, 12)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Reconciliation(ReconciliationError::AggregateTargetMissing { .. })
        ));

        // Rolled back: the entry is still pending.
        let entry = db::get_entry(&conn, entries[0].id).unwrap();
        assert_eq!(entry.status, EntryStatus::Pendente);
    }

    #[test]
    fn test_edit_amount_reconciles_goal() {
        let mut conn = test_conn();
        let target = goal::create_goal(&conn, "Casa", 5000.0, "🏠").unwrap();

        let entries = expand_commitment(
            &mut conn,
            &Commitment::GoalContribution(GoalContribution {
                goal_id: target.id,
                amount: 500.0,
                date: date(2026, 3, 12),
                responsible: None,
            }),
        )
        .unwrap();
        assert_eq!(goal::find_goal(&conn, target.id).unwrap().current_amount, 500.0);

        edit_entry(&mut conn, entries[0].id, date(2026, 3, 12), "Meta: Casa | Paga", 300.0).unwrap();

        let loaded = goal::find_goal(&conn, target.id).unwrap();
        assert_eq!(loaded.current_amount, 300.0);

        let entry = db::get_entry(&conn, entries[0].id).unwrap();
        assert_eq!(entry.amount, 300.0);
    }

    #[test]
    fn test_edit_pending_debt_entry_skips_aggregate() {
        let mut conn = test_conn();
        let (debt_id, entries) = plan_car_loan(&mut conn);

        // Pending installments never fed paid_amount, so editing one must not.
        edit_entry(
            &mut conn,
            entries[0].id,
            date(2026, 1, 10),
            "Dívida: Car Loan (1/12) | Pendente",
            1100.0,
        )
        .unwrap();
        assert_eq!(debt::find_debt(&conn, debt_id).unwrap().paid_amount, 0.0);

        // Confirmation then counts the edited amount.
        confirm_payment(&mut conn, entries[0].id, date(2026, 1, 12)).unwrap();
        assert_eq!(debt::find_debt(&conn, debt_id).unwrap().paid_amount, 1100.0);
    }

    #[test]
    fn test_edit_paid_debt_entry_reconciles_paid_amount() {
        let mut conn = test_conn();
        let (debt_id, entries) = plan_car_loan(&mut conn);

        confirm_payment(&mut conn, entries[0].id, date(2026, 1, 12)).unwrap();
        assert_eq!(debt::find_debt(&conn, debt_id).unwrap().paid_amount, 1000.0);

        edit_entry(
            &mut conn,
            entries[0].id,
            date(2026, 1, 12),
            "Dívida: Car Loan (1/12) | Paga",
            900.0,
        )
        .unwrap();
        assert_eq!(debt::find_debt(&conn, debt_id).unwrap().paid_amount, 900.0);
    }

    #[test]
    fn test_edit_validation() {
        let mut conn = test_conn();
        let (_, entries) = plan_car_loan(&mut conn);

        assert!(edit_entry(&mut conn, entries[0].id, date(2026, 1, 10), "x", 0.0).is_err());
        assert!(edit_entry(&mut conn, entries[0].id, date(2026, 1, 10), "  ", 10.0).is_err());
    }

    #[test]
    fn test_delete_investment_entry_reverses_position() {
        let mut conn = test_conn();
        let asset = investment::create_asset_type(&conn, "CDB Itaú", "#58a6ff").unwrap();

        let entries = expand_commitment(
            &mut conn,
            &Commitment::InvestmentContribution(InvestmentContribution {
                asset_type_id: asset.id,
                amount: 800.0,
                date: date(2026, 3, 15),
                responsible: None,
            }),
        )
        .unwrap();
        assert_eq!(
            investment::position_for(&conn, asset.id).unwrap().unwrap().accumulated,
            800.0
        );

        delete_entry(&mut conn, entries[0].id).unwrap();

        assert_eq!(
            investment::position_for(&conn, asset.id).unwrap().unwrap().accumulated,
            0.0
        );
        assert!(db::get_entry(&conn, entries[0].id).is_err());
    }

    #[test]
    fn test_delete_goal_entry_reverses_goal() {
        let mut conn = test_conn();
        let target = goal::create_goal(&conn, "Viagem", 3000.0, "✈️").unwrap();

        let entries = expand_commitment(
            &mut conn,
            &Commitment::GoalContribution(GoalContribution {
                goal_id: target.id,
                amount: 250.0,
                date: date(2026, 3, 15),
                responsible: None,
            }),
        )
        .unwrap();

        delete_entry(&mut conn, entries[0].id).unwrap();
        assert_eq!(goal::find_goal(&conn, target.id).unwrap().current_amount, 0.0);
    }

    #[test]
    fn test_delete_standalone_expense_has_no_side_effects() {
        let mut conn = test_conn();
        let entries = expand_commitment(
            &mut conn,
            &Commitment::Expense(ExpenseCommitment {
                description: "Mercado".to_string(),
                category: "Alimentação".to_string(),
                amount: 100.0,
                purchase_date: date(2026, 3, 10),
                installments: 1,
                responsible: None,
                payment: PaymentDetails::Cash {
                    method: PaymentMethod::Pix,
                    pending: false,
                },
            }),
        )
        .unwrap();

        delete_entry(&mut conn, entries[0].id).unwrap();
        assert_eq!(db::ledger_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_delete_reversal_target_missing_rolls_back() {
        let mut conn = test_conn();
        let asset = investment::create_asset_type(&conn, "PETR4", "#3fb950").unwrap();

        let entries = expand_commitment(
            &mut conn,
            &Commitment::InvestmentContribution(InvestmentContribution {
                asset_type_id: asset.id,
                amount: 500.0,
                date: date(2026, 3, 15),
                responsible: None,
            }),
        )
        .unwrap();

        // Asset vanished behind our back.
        conn.execute("DELETE FROM investment_positions", []).unwrap();
        conn.execute("DELETE FROM asset_types", []).unwrap();

        let err = delete_entry(&mut conn, entries[0].id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Reconciliation(ReconciliationError::AggregateTargetMissing { .. })
        ));

        // Rolled back: the entry survived.
        assert!(db::get_entry(&conn, entries[0].id).is_ok());
    }

    #[test]
    fn test_delete_debt_partial_cascade() {
        let mut conn = test_conn();
        let (debt_id, entries) = plan_car_loan(&mut conn);

        // Two installments already paid.
        confirm_payment(&mut conn, entries[0].id, date(2026, 1, 12)).unwrap();
        confirm_payment(&mut conn, entries[1].id, date(2026, 2, 12)).unwrap();

        let removed = delete_debt(&mut conn, debt_id).unwrap();
        assert_eq!(removed, 10);

        // Debt row gone, paid history intact.
        assert!(debt::find_debt(&conn, debt_id).is_err());
        let remaining = db::all_entries(&conn).unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.status == EntryStatus::Paga));
    }

    #[test]
    fn test_delete_debt_does_not_match_name_prefixes() {
        let mut conn = test_conn();

        let car = debt::register_debt(
            &conn,
            &DebtDraft {
                name: "Carro".to_string(),
                total_amount: 1000.0,
                due_reference: None,
                responsible: None,
            },
        )
        .unwrap();
        let car_new = debt::register_debt(
            &conn,
            &DebtDraft {
                name: "Carro Novo".to_string(),
                total_amount: 2000.0,
                due_reference: None,
                responsible: None,
            },
        )
        .unwrap();

        for (id, n) in [(car.id, 2u32), (car_new.id, 4u32)] {
            expand_commitment(
                &mut conn,
                &Commitment::DebtPaymentPlan(DebtPaymentPlan {
                    debt_id: id,
                    installments: n,
                    start_date: date(2026, 1, 10),
                    installment_amount: None,
                    down_payment: None,
                }),
            )
            .unwrap();
        }

        // Deleting "Carro" must leave "Carro Novo" untouched.
        delete_debt(&mut conn, car.id).unwrap();

        let remaining = db::all_entries(&conn).unwrap();
        assert_eq!(remaining.len(), 4);
        assert!(remaining
            .iter()
            .all(|e| e.group_name.as_deref() == Some("Carro Novo")));
    }

    #[test]
    fn test_legacy_contribution_rows_require_migration() {
        let mut conn = test_conn();

        conn.execute(
            "INSERT INTO ledger_entries (date, description, category, amount, movement_type, cost_type)
             VALUES ('2026-01-10', 'Aporte Invest: CDB Itaú | Paga', 'Investimento', 300.0, 'Despesa', 'Investimento')",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();

        let err = delete_entry(&mut conn, id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Reconciliation(ReconciliationError::MissingLinkage(_))
        ));
    }
}
