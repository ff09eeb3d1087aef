// 🚨 Error Taxonomy - Validation / Reference / Reconciliation
//
// Three failure families, surfaced before any write happens:
// - ValidationError: bad user input (non-positive amount, missing name, ...)
// - ReferenceError: dangling lookup (card, category, goal, asset, debt)
// - ReconciliationError: aggregate update against a missing or wrong-state target
//
// Everything multi-statement runs inside a SQLite transaction, so a failure
// mid-operation never leaves partial writes behind.

use thiserror::Error;

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("description must not be empty")]
    EmptyDescription,

    #[error("name must not be empty")]
    EmptyName,

    #[error("installment count must be at least 1, got {0}")]
    InvalidInstallments(i64),

    #[error("card day must be within 1..=31, got {0}")]
    InvalidCardDay(u32),
}

// ============================================================================
// REFERENCES
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("expense category not found: {0}")]
    CategoryNotFound(String),

    #[error("credit card not found: {0}")]
    CardNotFound(String),

    #[error("goal not found: {0}")]
    GoalNotFound(i64),

    #[error("asset type not found: {0}")]
    AssetTypeNotFound(i64),

    #[error("debt not found: {0}")]
    DebtNotFound(i64),

    #[error("ledger entry not found: {0}")]
    EntryNotFound(i64),
}

// ============================================================================
// RECONCILIATION
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ReconciliationError {
    /// Payment confirmation requires a "Pendente" entry. Confirming twice
    /// would double-count into the owning aggregate.
    #[error("entry {0} is not pending")]
    EntryNotPending(i64),

    /// The entry predates the structured-linkage schema and its label says it
    /// feeds an aggregate. Run the legacy-label migration before touching it.
    #[error("entry {0} has no linkage columns (run migrate_legacy_labels first)")]
    MissingLinkage(i64),

    /// The aggregate row this entry points at no longer exists.
    #[error("aggregate target missing for entry {entry_id}: {target}")]
    AggregateTargetMissing { entry_id: i64, target: String },
}

// ============================================================================
// UNIFIED ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::NonPositiveAmount(-3.5);
        assert_eq!(err.to_string(), "amount must be positive, got -3.5");

        let err = ReferenceError::CardNotFound("Nubank".to_string());
        assert_eq!(err.to_string(), "credit card not found: Nubank");

        let err = ReconciliationError::EntryNotPending(42);
        assert_eq!(err.to_string(), "entry 42 is not pending");
    }

    #[test]
    fn test_core_error_wraps_all_families() {
        let core: CoreError = ValidationError::EmptyDescription.into();
        assert!(matches!(core, CoreError::Validation(_)));

        let core: CoreError = ReferenceError::GoalNotFound(1).into();
        assert!(matches!(core, CoreError::Reference(_)));

        let core: CoreError = ReconciliationError::EntryNotPending(1).into();
        assert!(matches!(core, CoreError::Reconciliation(_)));
    }
}
