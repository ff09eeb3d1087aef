// 📊 Monthly Aggregation - buckets, net balance, 50/30/20 health check
//
// Read-side only: nothing here mutates the store. Entries are partitioned by
// movement and cost type into Income / general Expense / Debt / Goal /
// Investment buckets, and the 50/30/20 rule grades the month against income:
//   Essential (Fixo + Dívida)  ≤ 50%
//   Discretionary (Variável)   ≤ 30%
//   Invested (Investimento)    ≥ 20%

use crate::db::month_bounds;
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;

// ============================================================================
// MONTHLY SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub income: f64,
    /// Despesa entries that are not Meta/Investimento/Dívida.
    pub general_expense: f64,
    pub debt: f64,
    pub goal: f64,
    pub investment: f64,
}

impl MonthlySummary {
    pub fn total_outflow(&self) -> f64 {
        self.general_expense + self.debt + self.goal + self.investment
    }

    pub fn net_balance(&self) -> f64 {
        self.income - self.total_outflow()
    }
}

pub fn monthly_summary(conn: &Connection, year: i32, month: u32) -> Result<MonthlySummary> {
    let (start, end) = month_bounds(year, month);

    let (income, general_expense, debt, goal, investment) = conn.query_row(
        "SELECT
            IFNULL(SUM(CASE WHEN movement_type = 'Receita' THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN movement_type = 'Despesa'
                            AND cost_type NOT IN ('Meta', 'Investimento', 'Dívida')
                            THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN cost_type = 'Dívida' THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN cost_type = 'Meta' THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN cost_type = 'Investimento' THEN amount ELSE 0 END), 0)
         FROM ledger_entries
         WHERE date >= ?1 AND date < ?2",
        params![start, end],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )?;

    Ok(MonthlySummary {
        year,
        month,
        income,
        general_expense,
        debt,
        goal,
        investment,
    })
}

// ============================================================================
// 50/30/20 HEALTH CHECK
// ============================================================================

pub const ESSENTIAL_TARGET: f64 = 0.50;
pub const DISCRETIONARY_TARGET: f64 = 0.30;
pub const INVESTED_TARGET: f64 = 0.20;

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub income: f64,
    /// Fixed expenses + debt service.
    pub essential: f64,
    /// Pure-variable expenses.
    pub discretionary: f64,
    pub invested: f64,
}

impl HealthCheck {
    fn share(&self, value: f64) -> f64 {
        if self.income > 0.0 {
            value / self.income
        } else {
            0.0
        }
    }

    pub fn essential_share(&self) -> f64 {
        self.share(self.essential)
    }

    pub fn discretionary_share(&self) -> f64 {
        self.share(self.discretionary)
    }

    pub fn invested_share(&self) -> f64 {
        self.share(self.invested)
    }

    pub fn essential_on_target(&self) -> bool {
        self.essential_share() <= ESSENTIAL_TARGET
    }

    pub fn discretionary_on_target(&self) -> bool {
        self.discretionary_share() <= DISCRETIONARY_TARGET
    }

    pub fn invested_on_target(&self) -> bool {
        self.invested_share() >= INVESTED_TARGET
    }
}

pub fn health_check(conn: &Connection, year: i32, month: u32) -> Result<HealthCheck> {
    let (start, end) = month_bounds(year, month);

    let (income, essential, discretionary, invested) = conn.query_row(
        "SELECT
            IFNULL(SUM(CASE WHEN movement_type = 'Receita' THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN movement_type = 'Despesa'
                            AND cost_type IN ('Fixo', 'Dívida')
                            THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN movement_type = 'Despesa'
                            AND cost_type = 'Variável'
                            THEN amount ELSE 0 END), 0),
            IFNULL(SUM(CASE WHEN cost_type = 'Investimento' THEN amount ELSE 0 END), 0)
         FROM ledger_entries
         WHERE date >= ?1 AND date < ?2",
        params![start, end],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;

    Ok(HealthCheck {
        income,
        essential,
        discretionary,
        invested,
    })
}

// ============================================================================
// ANNUAL EVOLUTION
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MonthFlow {
    pub month: u32,
    pub income: f64,
    pub expense: f64,
}

/// Income/expense totals per month of `year`; months without entries come
/// back as zeros so charts always get 12 points.
pub fn annual_evolution(conn: &Connection, year: i32) -> Result<Vec<MonthFlow>> {
    let start = format!("{year:04}-01-01");
    let end = format!("{:04}-01-01", year + 1);

    let mut flows: Vec<MonthFlow> = (1..=12)
        .map(|month| MonthFlow {
            month,
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT CAST(substr(date, 6, 2) AS INTEGER) AS m,
                IFNULL(SUM(CASE WHEN movement_type = 'Receita' THEN amount ELSE 0 END), 0),
                IFNULL(SUM(CASE WHEN movement_type = 'Despesa' THEN amount ELSE 0 END), 0)
         FROM ledger_entries
         WHERE date >= ?1 AND date < ?2
         GROUP BY m",
    )?;

    let rows = stmt.query_map(params![start, end], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    for row in rows {
        let (month, income, expense) = row?;
        if (1..=12).contains(&month) {
            flows[month as usize - 1].income = income;
            flows[month as usize - 1].expense = expense;
        }
    }

    Ok(flows)
}

// ============================================================================
// CARD DUE ALERTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardAlertKind {
    /// Due within the next 5 days (inclusive of today).
    DueSoon { days: i64 },
    /// This month's due day already passed.
    Overdue,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardAlert {
    pub card: String,
    pub due_day: u32,
    pub kind: CardAlertKind,
}

pub fn card_due_alerts(conn: &Connection, today: NaiveDate) -> Result<Vec<CardAlert>> {
    let mut stmt = conn.prepare("SELECT name, due_day FROM credit_cards ORDER BY name")?;
    let cards = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let day = today.day() as i64;
    let mut alerts = Vec::new();

    for (name, due_day) in cards {
        let delta = due_day as i64 - day;
        if (0..=5).contains(&delta) {
            alerts.push(CardAlert {
                card: name,
                due_day,
                kind: CardAlertKind::DueSoon { days: delta },
            });
        } else if delta < 0 {
            alerts.push(CardAlert {
                card: name,
                due_day,
                kind: CardAlertKind::Overdue,
            });
        }
    }

    Ok(alerts)
}

// ============================================================================
// TESTS
// ============================================================================
