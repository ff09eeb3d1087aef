// Finance Cockpit - Core Library
// Ledger expansion and reconciliation for a personal-finance tracker:
// commitments expand into dated ledger entries, and aggregate balances
// (goal progress, investment positions, debt amortization) stay consistent
// under insert/edit/delete/pay.

pub mod db;
pub mod entities;
pub mod error;
pub mod expand;
pub mod export;
pub mod label;
pub mod reconciliation;
pub mod schedule;
pub mod summary;

// Re-export commonly used types
pub use db::{
    all_entries, entries_for_group, entries_for_month, get_entry, get_events_for_entity,
    insert_event, ledger_count, migrate_legacy_labels, setup_database, CostType, EntryStatus,
    Event, GroupKind, LedgerEntry, MovementType, PaymentMethod,
};
pub use entities::{
    card, catalog, debt, goal, investment, Allocation, AssetType, BenefitCard, CreditCard, Debt,
    DebtDraft, ExpenseCategory, Goal, GoalOverview, InvestmentPosition,
};
pub use error::{CoreError, ReconciliationError, ReferenceError, Result, ValidationError};
pub use expand::{
    expand_commitment, Commitment, DebtPaymentPlan, DownPayment, ExpenseCommitment,
    GoalContribution, IncomeCommitment, InvestmentContribution, PaymentDetails,
};
pub use export::{export_month_csv, write_month_csv};
pub use label::{parse_legacy, render, ParsedLabel};
pub use reconciliation::{confirm_payment, delete_debt, delete_entry, edit_entry};
pub use summary::{
    annual_evolution, card_due_alerts, health_check, monthly_summary, CardAlert, CardAlertKind,
    HealthCheck, MonthFlow, MonthlySummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
