// 🧾 Commitment Expander - one financial intent → dated ledger rows
//
// Every user action that creates cash-flow rows funnels through here:
// standalone expenses/income, goal and investment contributions, debt
// registration and debt payment plans. The expander validates input, resolves
// lookups, splits the amount across calendar-month installments, assigns the
// pending/paid status, and applies the aggregate side effects — all inside a
// single SQLite transaction, so a failure never leaves partial writes.
//
// Status rules:
// - credit-card entries always start "Pendente" (they become real money when
//   the invoice is paid);
// - everything else defaults to "Paga" unless the caller explicitly marks a
//   non-credit expense pending;
// - goal/investment contributions are committed money: they post as "Paga"
//   and hit the owning aggregate immediately.

use crate::db::{
    self, CostType, EntryStatus, Event, GroupKind, LedgerEntry, MovementType, PaymentMethod,
};
use crate::entities::debt::{self, DebtDraft};
use crate::entities::{card, catalog, goal, investment};
use crate::error::{Result, ValidationError};
use crate::label;
use crate::schedule;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

// ============================================================================
// COMMITMENT DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone)]
pub enum Commitment {
    Expense(ExpenseCommitment),
    Income(IncomeCommitment),
    GoalContribution(GoalContribution),
    InvestmentContribution(InvestmentContribution),
    DebtRegistration(DebtDraft),
    DebtPaymentPlan(DebtPaymentPlan),
}

#[derive(Debug, Clone)]
pub struct ExpenseCommitment {
    pub description: String,
    /// Must exist in `expense_categories`; supplies the Fixed/Variable kind.
    pub category: String,
    pub amount: f64,
    pub purchase_date: NaiveDate,
    pub installments: u32,
    pub responsible: Option<String>,
    pub payment: PaymentDetails,
}

#[derive(Debug, Clone)]
pub enum PaymentDetails {
    Cash {
        method: PaymentMethod,
        /// Explicit "Pendente" for non-credit methods.
        pending: bool,
    },
    Credit {
        /// Card name; its closing/due days anchor the installment sequence.
        card: String,
    },
}

#[derive(Debug, Clone)]
pub struct IncomeCommitment {
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub responsible: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoalContribution {
    pub goal_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub responsible: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvestmentContribution {
    pub asset_type_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub responsible: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DownPayment {
    pub amount: f64,
    pub date: NaiveDate,
    /// Settled at inception: posts as "Paga" and counts into `paid_amount`
    /// right away.
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct DebtPaymentPlan {
    pub debt_id: i64,
    /// Regular installments. May be 0 only when a down payment covers the
    /// whole plan.
    pub installments: u32,
    /// Anchor for the first regular installment when there is no down
    /// payment; with one, the anchor is one month after the down payment.
    pub start_date: NaiveDate,
    /// Overrides the derived per-installment amount. The recomputed total
    /// `paid + down + n × amount` then REPLACES the debt's stored total.
    pub installment_amount: Option<f64>,
    pub down_payment: Option<DownPayment>,
}

// ============================================================================
// EXPANSION
// ============================================================================

/// Expand a commitment into ledger entries, applying aggregate side effects
/// in the same transaction. Returns the inserted entries (ids filled in);
/// debt registration creates no entries and returns an empty list.
pub fn expand_commitment(conn: &mut Connection, commitment: &Commitment) -> Result<Vec<LedgerEntry>> {
    match commitment {
        Commitment::Expense(c) => expand_expense(conn, c),
        Commitment::Income(c) => expand_income(conn, c),
        Commitment::GoalContribution(c) => expand_goal_contribution(conn, c),
        Commitment::InvestmentContribution(c) => expand_investment_contribution(conn, c),
        Commitment::DebtRegistration(draft) => {
            let tx = conn.transaction()?;
            let registered = debt::register_debt(&tx, draft)?;
            let event = Event::new(
                "debt_registered",
                "debt",
                &registered.id.to_string(),
                serde_json::json!({ "name": registered.name, "total": registered.total_amount }),
                "expander",
            );
            db::insert_event(&tx, &event)?;
            tx.commit()?;
            Ok(Vec::new())
        }
        Commitment::DebtPaymentPlan(plan) => expand_debt_plan(conn, plan),
    }
}

fn check_amount(amount: f64) -> Result<()> {
    if amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(amount).into());
    }
    Ok(())
}

fn new_group_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn insert_all(tx: &Connection, entries: &mut [LedgerEntry]) -> Result<()> {
    for entry in entries.iter_mut() {
        entry.id = db::insert_entry(tx, entry)?;
    }
    Ok(())
}

fn expand_expense(conn: &mut Connection, c: &ExpenseCommitment) -> Result<Vec<LedgerEntry>> {
    if c.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription.into());
    }
    check_amount(c.amount)?;
    if c.installments < 1 {
        return Err(ValidationError::InvalidInstallments(c.installments as i64).into());
    }

    let cost_type = catalog::expense_cost_kind(conn, &c.category)?;

    // Credit purchases anchor on the card's due date, not the purchase date.
    let (reference, status, method, card_name) = match &c.payment {
        PaymentDetails::Credit { card: name } => {
            let card = card::find_card_by_name(conn, name)?;
            let anchor =
                schedule::credit_reference_date(c.purchase_date, card.closing_day, card.due_day);
            (anchor, EntryStatus::Pendente, PaymentMethod::Credito, Some(card.name))
        }
        PaymentDetails::Cash { method, pending } => {
            let status = if *pending {
                EntryStatus::Pendente
            } else {
                EntryStatus::Paga
            };
            (c.purchase_date, status, *method, None)
        }
    };

    let amounts = schedule::split_installments(c.amount, c.installments);
    let dates = schedule::installment_dates(reference, c.installments);
    let group_id = new_group_id();

    let mut entries = Vec::with_capacity(c.installments as usize);
    for (i, (&amount, &date)) in amounts.iter().zip(dates.iter()).enumerate() {
        let mut entry = LedgerEntry {
            id: 0,
            date,
            description: String::new(),
            category: c.category.clone(),
            amount,
            movement: MovementType::Despesa,
            cost_type,
            group_kind: Some(GroupKind::Despesa),
            group_id: Some(group_id.clone()),
            group_name: Some(c.description.trim().to_string()),
            installment_index: i as i64 + 1,
            installment_count: c.installments as i64,
            responsible: c.responsible.clone(),
            payment_method: Some(method),
            card: card_name.clone(),
            status,
        };
        entry.description = label::render(&entry);
        entries.push(entry);
    }

    let tx = conn.transaction()?;
    insert_all(&tx, &mut entries)?;
    let event = Event::new(
        "commitment_expanded",
        "ledger_group",
        &group_id,
        serde_json::json!({
            "kind": "Despesa",
            "total": c.amount,
            "installments": c.installments,
        }),
        "expander",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(entries)
}

fn expand_income(conn: &mut Connection, c: &IncomeCommitment) -> Result<Vec<LedgerEntry>> {
    if c.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription.into());
    }
    check_amount(c.amount)?;

    let group_id = new_group_id();
    let mut entry = LedgerEntry {
        id: 0,
        date: c.date,
        description: String::new(),
        category: c.category.clone(),
        amount: c.amount,
        movement: MovementType::Receita,
        cost_type: CostType::Receita,
        group_kind: Some(GroupKind::Receita),
        group_id: Some(group_id.clone()),
        group_name: Some(c.description.trim().to_string()),
        installment_index: 1,
        installment_count: 1,
        responsible: c.responsible.clone(),
        payment_method: None,
        card: None,
        status: EntryStatus::Paga,
    };
    entry.description = label::render(&entry);

    let tx = conn.transaction()?;
    entry.id = db::insert_entry(&tx, &entry)?;
    let event = Event::new(
        "commitment_expanded",
        "ledger_group",
        &group_id,
        serde_json::json!({ "kind": "Receita", "total": c.amount }),
        "expander",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(vec![entry])
}

fn expand_goal_contribution(conn: &mut Connection, c: &GoalContribution) -> Result<Vec<LedgerEntry>> {
    check_amount(c.amount)?;
    let target = goal::find_goal(conn, c.goal_id)?;

    let group_id = new_group_id();
    let mut entry = LedgerEntry {
        id: 0,
        date: c.date,
        description: String::new(),
        category: "Meta".to_string(),
        amount: c.amount,
        movement: MovementType::Despesa,
        cost_type: CostType::Meta,
        group_kind: Some(GroupKind::Meta),
        group_id: Some(group_id.clone()),
        group_name: Some(target.name.clone()),
        installment_index: 1,
        installment_count: 1,
        responsible: c.responsible.clone(),
        payment_method: None,
        card: None,
        status: EntryStatus::Paga,
    };
    entry.description = label::render(&entry);

    let tx = conn.transaction()?;
    entry.id = db::insert_entry(&tx, &entry)?;
    goal::adjust_goal(&tx, target.id, c.amount)?;
    let event = Event::new(
        "commitment_expanded",
        "ledger_group",
        &group_id,
        serde_json::json!({ "kind": "Meta", "goal": target.name, "total": c.amount }),
        "expander",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(vec![entry])
}

fn expand_investment_contribution(
    conn: &mut Connection,
    c: &InvestmentContribution,
) -> Result<Vec<LedgerEntry>> {
    check_amount(c.amount)?;
    let asset = investment::find_asset_type(conn, c.asset_type_id)?;

    let group_id = new_group_id();
    let mut entry = LedgerEntry {
        id: 0,
        date: c.date,
        description: String::new(),
        category: "Investimento".to_string(),
        amount: c.amount,
        movement: MovementType::Despesa,
        cost_type: CostType::Investimento,
        group_kind: Some(GroupKind::Investimento),
        group_id: Some(group_id.clone()),
        group_name: Some(asset.name.clone()),
        installment_index: 1,
        installment_count: 1,
        responsible: c.responsible.clone(),
        payment_method: None,
        card: None,
        status: EntryStatus::Paga,
    };
    entry.description = label::render(&entry);

    let tx = conn.transaction()?;
    entry.id = db::insert_entry(&tx, &entry)?;
    if investment::adjust_position(&tx, asset.id, c.amount)? == 0 {
        // Position row missing on a pre-seeding database; create it.
        tx.execute(
            "INSERT INTO investment_positions (asset_type_id, accumulated) VALUES (?1, ?2)",
            params![asset.id, c.amount],
        )?;
    }
    let event = Event::new(
        "commitment_expanded",
        "ledger_group",
        &group_id,
        serde_json::json!({ "kind": "Investimento", "asset": asset.name, "total": c.amount }),
        "expander",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(vec![entry])
}

fn expand_debt_plan(conn: &mut Connection, plan: &DebtPaymentPlan) -> Result<Vec<LedgerEntry>> {
    let target = debt::find_debt(conn, plan.debt_id)?;

    if let Some(down) = &plan.down_payment {
        check_amount(down.amount)?;
    } else if plan.installments < 1 {
        // A plan with zero installments only makes sense as a lone down payment.
        return Err(ValidationError::InvalidInstallments(plan.installments as i64).into());
    }
    if let Some(amount) = plan.installment_amount {
        check_amount(amount)?;
    }

    let down_amount = plan.down_payment.as_ref().map_or(0.0, |d| d.amount);
    let remaining = target.total_amount - target.paid_amount - down_amount;

    // Per-installment amounts: user override wins; otherwise the remainder is
    // split exactly across the chosen count.
    let amounts: Vec<f64> = if plan.installments == 0 {
        Vec::new()
    } else if let Some(amount) = plan.installment_amount {
        vec![amount; plan.installments as usize]
    } else {
        check_amount(remaining)?;
        schedule::split_installments(remaining, plan.installments)
    };

    let installment_total: f64 = amounts.iter().sum();
    // The plan defines the debt from here on; this REPLACES the stored total.
    let new_total = target.paid_amount + down_amount + installment_total;

    let anchor = match &plan.down_payment {
        Some(down) => schedule::add_months(down.date, 1),
        None => plan.start_date,
    };
    let payment_form = if plan.installments > 1 { "Parcelado" } else { "À Vista" };

    let group_id = new_group_id();
    let mut entries = Vec::new();

    if let Some(down) = &plan.down_payment {
        let mut entry = LedgerEntry {
            id: 0,
            date: down.date,
            description: String::new(),
            category: "Dívidas".to_string(),
            amount: down.amount,
            movement: MovementType::Despesa,
            cost_type: CostType::Divida,
            group_kind: Some(GroupKind::Divida),
            group_id: Some(group_id.clone()),
            group_name: Some(target.name.clone()),
            installment_index: 0,
            installment_count: 1,
            responsible: target.responsible.clone(),
            payment_method: None,
            card: None,
            status: if down.settled {
                EntryStatus::Paga
            } else {
                EntryStatus::Pendente
            },
        };
        entry.description = label::render(&entry);
        entries.push(entry);
    }

    for (i, &amount) in amounts.iter().enumerate() {
        let mut entry = LedgerEntry {
            id: 0,
            date: schedule::add_months(anchor, i as u32),
            description: String::new(),
            category: "Dívidas".to_string(),
            amount,
            movement: MovementType::Despesa,
            cost_type: CostType::Divida,
            group_kind: Some(GroupKind::Divida),
            group_id: Some(group_id.clone()),
            group_name: Some(target.name.clone()),
            installment_index: i as i64 + 1,
            installment_count: plan.installments as i64,
            responsible: target.responsible.clone(),
            payment_method: None,
            card: None,
            status: EntryStatus::Pendente,
        };
        entry.description = label::render(&entry);
        entries.push(entry);
    }

    let tx = conn.transaction()?;
    insert_all(&tx, &mut entries)?;

    tx.execute(
        "UPDATE debts
         SET total_amount = ?1, payment_form = ?2, installment_count = ?3, due_reference = ?4
         WHERE id = ?5",
        params![
            new_total,
            payment_form,
            plan.installments.max(1) as i64,
            db::date_to_sql(anchor),
            target.id,
        ],
    )?;

    if let Some(down) = &plan.down_payment {
        if down.settled {
            debt::add_payment(&tx, target.id, down.amount)?;
        }
    }

    let event = Event::new(
        "payment_plan_generated",
        "debt",
        &target.id.to_string(),
        serde_json::json!({
            "debt": target.name,
            "installments": plan.installments,
            "down_payment": down_amount,
            "new_total": new_total,
        }),
        "expander",
    );
    db::insert_event(&tx, &event)?;
    tx.commit()?;

    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================
