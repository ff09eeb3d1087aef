use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;
use std::env;
use std::path::Path;

use finance_cockpit::{
    card_due_alerts, catalog, expand_commitment, export_month_csv, health_check, ledger_count,
    migrate_legacy_labels, monthly_summary, setup_database, Commitment, CostType, DebtDraft,
    DebtPaymentPlan, ExpenseCommitment, GoalContribution, IncomeCommitment, PaymentDetails,
    PaymentMethod, VERSION,
};
use finance_cockpit::entities::{card, debt, goal, investment};
use finance_cockpit::summary::CardAlertKind;

const DB_PATH: &str = "financeiro.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("seed") => run_seed(),
        Some("migrate") => run_migrate(),
        Some("summary") => {
            let (year, month) = parse_year_month(&args)?;
            run_summary(year, month)
        }
        Some("export") => {
            let (year, month) = parse_year_month(&args)?;
            let path = args
                .get(4)
                .map(String::as_str)
                .unwrap_or("lancamentos.csv");
            run_export(year, month, path)
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn parse_year_month(args: &[String]) -> Result<(i32, u32)> {
    let today = Local::now().date_naive();
    let year = match args.get(2) {
        Some(y) => y.parse()?,
        None => chrono::Datelike::year(&today),
    };
    let month = match args.get(3) {
        Some(m) => m.parse()?,
        None => chrono::Datelike::month(&today),
    };
    Ok((year, month))
}

fn print_usage() {
    println!("💰 Finance Cockpit v{VERSION}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  finance-cockpit init                      create {DB_PATH} with the full schema");
    println!("  finance-cockpit seed                      load a demo dataset");
    println!("  finance-cockpit migrate                   backfill linkage on legacy rows");
    println!("  finance-cockpit summary [year] [month]    monthly buckets + 50/30/20 check");
    println!("  finance-cockpit export [year] [month] [file.csv]");
}

fn open_db() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_init() -> Result<()> {
    println!("🔧 Setting up database...");
    let conn = open_db()?;
    let count = ledger_count(&conn)?;
    println!("✓ Database ready at {DB_PATH} ({count} ledger entries)");
    Ok(())
}

fn run_migrate() -> Result<()> {
    let mut conn = open_db()?;
    println!("🏷️  Backfilling structured linkage from legacy labels...");
    let updated = migrate_legacy_labels(&mut conn)?;
    println!("✓ Migrated {updated} legacy rows");
    Ok(())
}

fn run_seed() -> Result<()> {
    let mut conn = open_db()?;
    println!("🌱 Seeding demo data...");

    // Catalog
    catalog::add_expense_category(&conn, "Alimentação", CostType::Variavel)?;
    catalog::add_expense_category(&conn, "Aluguel", CostType::Fixo)?;
    catalog::add_income_category(&conn, "Salário")?;
    catalog::add_responsible(&conn, "Geral")?;
    card::create_credit_card(&conn, "Nubank", Some(8000.0), 25, 5)?;
    println!("✓ Catalog: categories, responsible, credit card");

    // Aggregates
    let house = goal::create_goal(&conn, "Casa Própria", 50000.0, "🏠")?;
    let cdb = investment::create_asset_type(&conn, "CDB Itaú", "#58a6ff")?;
    println!("✓ Goal '{}' and asset '{}'", house.name, cdb.name);

    let today = Local::now().date_naive();

    // Commitments
    expand_commitment(
        &mut conn,
        &Commitment::Income(IncomeCommitment {
            description: "Salário".to_string(),
            category: "Salário".to_string(),
            amount: 7000.0,
            date: today,
            responsible: Some("Geral".to_string()),
        }),
    )?;

    expand_commitment(
        &mut conn,
        &Commitment::Expense(ExpenseCommitment {
            description: "Mercado".to_string(),
            category: "Alimentação".to_string(),
            amount: 850.0,
            purchase_date: today,
            installments: 1,
            responsible: Some("Geral".to_string()),
            payment: PaymentDetails::Cash {
                method: PaymentMethod::Pix,
                pending: false,
            },
        }),
    )?;

    let installments = expand_commitment(
        &mut conn,
        &Commitment::Expense(ExpenseCommitment {
            description: "Notebook".to_string(),
            category: "Alimentação".to_string(),
            amount: 3600.0,
            purchase_date: today,
            installments: 10,
            responsible: Some("Geral".to_string()),
            payment: PaymentDetails::Credit {
                card: "Nubank".to_string(),
            },
        }),
    )?;
    println!(
        "✓ Credit purchase split into {} installments starting {}",
        installments.len(),
        installments[0].date
    );

    expand_commitment(
        &mut conn,
        &Commitment::GoalContribution(GoalContribution {
            goal_id: house.id,
            amount: 500.0,
            date: today,
            responsible: Some("Geral".to_string()),
        }),
    )?;

    expand_commitment(
        &mut conn,
        &Commitment::DebtRegistration(DebtDraft {
            name: "Financiamento Carro".to_string(),
            total_amount: 12000.0,
            due_reference: None,
            responsible: Some("Geral".to_string()),
        }),
    )?;
    let car = debt::find_debt_by_name(&conn, "Financiamento Carro")?
        .ok_or_else(|| anyhow::anyhow!("debt not found after registration"))?;
    let plan_entries = expand_commitment(
        &mut conn,
        &Commitment::DebtPaymentPlan(DebtPaymentPlan {
            debt_id: car.id,
            installments: 12,
            start_date: today,
            installment_amount: None,
            down_payment: None,
        }),
    )?;
    println!("✓ Debt plan generated: {} pending installments", plan_entries.len());

    let count = ledger_count(&conn)?;
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Seed complete: {count} ledger entries");
    Ok(())
}

fn run_summary(year: i32, month: u32) -> Result<()> {
    let conn = open_db()?;

    println!("📊 Cash flow {month:02}/{year}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = monthly_summary(&conn, year, month)?;
    println!("Receitas:        R$ {:>12.2}", summary.income);
    println!("Despesas gerais: R$ {:>12.2}", summary.general_expense);
    println!("Dívidas:         R$ {:>12.2}", summary.debt);
    println!("Metas:           R$ {:>12.2}", summary.goal);
    println!("Investimentos:   R$ {:>12.2}", summary.investment);
    println!("Saldo do mês:    R$ {:>12.2}", summary.net_balance());

    let health = health_check(&conn, year, month)?;
    if health.income > 0.0 {
        println!("\n🩺 Saúde financeira (50/30/20)");
        println!(
            "  Essencial:     {:>5.1}%  (meta ≤ 50%) {}",
            health.essential_share() * 100.0,
            if health.essential_on_target() { "✓" } else { "⚠️" }
        );
        println!(
            "  Lazer:         {:>5.1}%  (meta ≤ 30%) {}",
            health.discretionary_share() * 100.0,
            if health.discretionary_on_target() { "✓" } else { "⚠️" }
        );
        println!(
            "  Investido:     {:>5.1}%  (meta ≥ 20%) {}",
            health.invested_share() * 100.0,
            if health.invested_on_target() { "✓" } else { "⚠️" }
        );
    } else {
        println!("\n⚠️  Sem receitas registradas para este período.");
    }

    let alerts = card_due_alerts(&conn, Local::now().date_naive())?;
    if !alerts.is_empty() {
        println!("\n🔔 Alertas de cartão");
        for alert in alerts {
            match alert.kind {
                CardAlertKind::DueSoon { days } => {
                    println!("  {}: vence em {} dia(s) (dia {})", alert.card, days, alert.due_day)
                }
                CardAlertKind::Overdue => {
                    println!("  {}: venceu no dia {}", alert.card, alert.due_day)
                }
            }
        }
    }

    Ok(())
}

fn run_export(year: i32, month: u32, path: &str) -> Result<()> {
    let conn = open_db()?;
    let rows = export_month_csv(&conn, year, month, Path::new(path))?;
    println!("✓ Exported {rows} entries to {path}");
    Ok(())
}
