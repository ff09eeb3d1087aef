// 🗄️ Ledger Store - SQLite schema, entry model, audit events
//
// The store keeps the legacy string-typed enumerations bit-compatible
// ("Receita"/"Despesa", "Fixo"/"Variável"/"Dívida"/"Meta"/"Investimento",
// "Paga"/"Pendente") and adds structured linkage columns so that no
// operation ever has to parse state back out of the description text.
// The description is DERIVED display text; the columns are authoritative.

use crate::error::{CoreError, ReferenceError, Result};
use crate::label;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ============================================================================
// STRING-TYPED ENUMERATIONS (legacy store compatibility)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    #[serde(rename = "Receita")]
    Receita,
    #[serde(rename = "Despesa")]
    Despesa,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receita => "Receita",
            MovementType::Despesa => "Despesa",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Receita" => Some(MovementType::Receita),
            "Despesa" => Some(MovementType::Despesa),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostType {
    #[serde(rename = "Fixo")]
    Fixo,
    #[serde(rename = "Variável")]
    Variavel,
    #[serde(rename = "Dívida")]
    Divida,
    #[serde(rename = "Meta")]
    Meta,
    #[serde(rename = "Investimento")]
    Investimento,
    #[serde(rename = "Receita")]
    Receita,
}

impl CostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostType::Fixo => "Fixo",
            CostType::Variavel => "Variável",
            CostType::Divida => "Dívida",
            CostType::Meta => "Meta",
            CostType::Investimento => "Investimento",
            CostType::Receita => "Receita",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Fixo" => Some(CostType::Fixo),
            "Variável" => Some(CostType::Variavel),
            "Dívida" => Some(CostType::Divida),
            "Meta" => Some(CostType::Meta),
            "Investimento" => Some(CostType::Investimento),
            "Receita" => Some(CostType::Receita),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    #[serde(rename = "Paga")]
    Paga,
    #[serde(rename = "Pendente")]
    Pendente,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Paga => "Paga",
            EntryStatus::Pendente => "Pendente",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Paga" => Some(EntryStatus::Paga),
            "Pendente" => Some(EntryStatus::Pendente),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Pix")]
    Pix,
    #[serde(rename = "Dinheiro")]
    Dinheiro,
    #[serde(rename = "Débito")]
    Debito,
    #[serde(rename = "Crédito")]
    Credito,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Dinheiro => "Dinheiro",
            PaymentMethod::Debito => "Débito",
            PaymentMethod::Credito => "Crédito",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pix" => Some(PaymentMethod::Pix),
            "Dinheiro" => Some(PaymentMethod::Dinheiro),
            "Débito" => Some(PaymentMethod::Debito),
            "Crédito" => Some(PaymentMethod::Credito),
            _ => None,
        }
    }
}

/// Which commitment group an entry belongs to. Previously this was encoded
/// only in the description prefix and parsed back with substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    #[serde(rename = "Despesa")]
    Despesa,
    #[serde(rename = "Receita")]
    Receita,
    #[serde(rename = "Meta")]
    Meta,
    #[serde(rename = "Investimento")]
    Investimento,
    #[serde(rename = "Dívida")]
    Divida,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Despesa => "Despesa",
            GroupKind::Receita => "Receita",
            GroupKind::Meta => "Meta",
            GroupKind::Investimento => "Investimento",
            GroupKind::Divida => "Dívida",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Despesa" => Some(GroupKind::Despesa),
            "Receita" => Some(GroupKind::Receita),
            "Meta" => Some(GroupKind::Meta),
            "Investimento" => Some(GroupKind::Investimento),
            "Dívida" => Some(GroupKind::Divida),
            _ => None,
        }
    }
}

// ============================================================================
// LEDGER ENTRY
// ============================================================================

/// One dated, amount-bearing row in the cash-flow table.
///
/// `group_kind` is `None` only for rows imported from the legacy store that
/// have not been through `migrate_legacy_labels` yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub movement: MovementType,
    pub cost_type: CostType,

    // Structured linkage (authoritative; description is derived from these)
    pub group_kind: Option<GroupKind>,
    /// One UUID per commitment expansion; every installment of a purchase
    /// shares it. `None` for legacy rows.
    pub group_id: Option<String>,
    /// Target name: debt/goal/asset name, or the free-text description for
    /// standalone expenses and income.
    pub group_name: Option<String>,
    pub installment_index: i64,
    pub installment_count: i64,
    pub responsible: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub card: Option<String>,
    pub status: EntryStatus,
}

impl LedgerEntry {
    /// Is this entry counted into an owning aggregate right now?
    ///
    /// Goal/investment contributions count from the moment they are created;
    /// debt installments count only once confirmed paid.
    pub fn is_counted(&self) -> bool {
        match self.group_kind {
            Some(GroupKind::Meta) | Some(GroupKind::Investimento) => true,
            Some(GroupKind::Divida) => self.status == EntryStatus::Paga,
            _ => false,
        }
    }
}

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn date_from_sql(s: &str) -> NaiveDate {
    // Legacy rows occasionally carry a trailing timestamp; the date part
    // always comes first.
    let head = &s[..10.min(s.len())];
    NaiveDate::parse_from_str(head, "%Y-%m-%d").unwrap_or_default()
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            movement_type TEXT NOT NULL,
            cost_type TEXT NOT NULL,
            -- structured linkage (NULL group_kind = legacy row, pre-migration)
            group_kind TEXT,
            group_id TEXT,
            group_name TEXT,
            installment_index INTEGER NOT NULL DEFAULT 1,
            installment_count INTEGER NOT NULL DEFAULT 1,
            responsible TEXT,
            payment_method TEXT,
            card TEXT,
            status TEXT NOT NULL DEFAULT 'Paga'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            target_amount REAL NOT NULL,
            current_amount REAL NOT NULL DEFAULT 0,
            icon TEXT NOT NULL DEFAULT '🎯'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS credit_cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            card_limit REAL,
            closing_day INTEGER NOT NULL,
            due_day INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS benefit_cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS asset_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            color TEXT NOT NULL DEFAULT '#58a6ff'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS investment_positions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asset_type_id INTEGER NOT NULL,
            accumulated REAL NOT NULL DEFAULT 0,
            FOREIGN KEY (asset_type_id) REFERENCES asset_types(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS debts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            total_amount REAL NOT NULL,
            paid_amount REAL NOT NULL DEFAULT 0,
            due_reference TEXT,
            responsible TEXT,
            payment_form TEXT,
            installment_count INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'Ativa'
        )",
        [],
    )?;

    // Lookup tables - pure foreign-key targets
    conn.execute(
        "CREATE TABLE IF NOT EXISTS income_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expense_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            cost_kind TEXT NOT NULL DEFAULT 'Variável'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS responsibles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )?;

    // Audit trail
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Indexes
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_date ON ledger_entries(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_group ON ledger_entries(group_kind, group_name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_status ON ledger_entries(status)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// LEDGER ENTRY CRUD
// ============================================================================

/// Insert one entry and return its row id. `entry.id` is ignored.
pub fn insert_entry(conn: &Connection, entry: &LedgerEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO ledger_entries (
            date, description, category, amount, movement_type, cost_type,
            group_kind, group_id, group_name, installment_index, installment_count,
            responsible, payment_method, card, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            date_to_sql(entry.date),
            entry.description,
            entry.category,
            entry.amount,
            entry.movement.as_str(),
            entry.cost_type.as_str(),
            entry.group_kind.map(|k| k.as_str()),
            entry.group_id,
            entry.group_name,
            entry.installment_index,
            entry.installment_count,
            entry.responsible,
            entry.payment_method.map(|m| m.as_str()),
            entry.card,
            entry.status.as_str(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

const ENTRY_COLUMNS: &str = "id, date, description, category, amount, movement_type, cost_type,
            group_kind, group_id, group_name, installment_index, installment_count,
            responsible, payment_method, card, status";

fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let date_str: String = row.get(1)?;
    let movement_str: String = row.get(5)?;
    let cost_str: String = row.get(6)?;
    let group_kind_str: Option<String> = row.get(7)?;
    let method_str: Option<String> = row.get(13)?;
    let status_str: String = row.get(15)?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        date: date_from_sql(&date_str),
        description: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        movement: MovementType::parse(&movement_str).unwrap_or(MovementType::Despesa),
        cost_type: CostType::parse(&cost_str).unwrap_or(CostType::Variavel),
        group_kind: group_kind_str.as_deref().and_then(GroupKind::parse),
        group_id: row.get(8)?,
        group_name: row.get(9)?,
        installment_index: row.get(10)?,
        installment_count: row.get(11)?,
        responsible: row.get(12)?,
        payment_method: method_str.as_deref().and_then(PaymentMethod::parse),
        card: row.get(14)?,
        status: EntryStatus::parse(&status_str).unwrap_or(EntryStatus::Paga),
    })
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<LedgerEntry> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1");
    conn.query_row(&sql, params![id], map_entry_row)
        .optional()?
        .ok_or_else(|| CoreError::Reference(ReferenceError::EntryNotFound(id)))
}

pub fn all_entries(conn: &Connection) -> Result<Vec<LedgerEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries ORDER BY date, id");
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map([], map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// First day of the month and first day of the next month, as SQL text.
pub(crate) fn month_bounds(year: i32, month: u32) -> (String, String) {
    let start = format!("{year:04}-{month:02}-01");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = format!("{next_year:04}-{next_month:02}-01");
    (start, end)
}

pub fn entries_for_month(conn: &Connection, year: i32, month: u32) -> Result<Vec<LedgerEntry>> {
    let (start, end) = month_bounds(year, month);
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE date >= ?1 AND date < ?2
         ORDER BY date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params![start, end], map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// All entries produced by one commitment expansion.
pub fn entries_for_group(conn: &Connection, group_id: &str) -> Result<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE group_id = ?1
         ORDER BY installment_index, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params![group_id], map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

pub fn ledger_count(conn: &Connection) -> Result<i64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// Append-only audit record; every mutating operation writes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data).unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(events)
}

// ============================================================================
// LEGACY-LABEL MIGRATION
// ============================================================================

/// Backfill structured linkage columns on rows imported from the legacy
/// store, where the description text was the only encoding of
/// kind/target/installment/responsible/method/status.
///
/// Call this ONCE after attaching a legacy database. Idempotent: rows that
/// already carry linkage are skipped.
pub fn migrate_legacy_labels(conn: &mut Connection) -> Result<usize> {
    let legacy: Vec<(i64, String, String)> = {
        let mut stmt = conn.prepare(
            "SELECT id, description, movement_type
             FROM ledger_entries
             WHERE group_kind IS NULL",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let tx = conn.transaction()?;
    let mut updated = 0;

    for (id, description, movement_str) in &legacy {
        let movement = MovementType::parse(movement_str).unwrap_or(MovementType::Despesa);
        let parsed = label::parse_legacy(description, movement);

        tx.execute(
            "UPDATE ledger_entries
             SET group_kind = ?1, group_name = ?2,
                 installment_index = ?3, installment_count = ?4,
                 responsible = ?5, payment_method = ?6, card = ?7, status = ?8
             WHERE id = ?9",
            params![
                parsed.group_kind.as_str(),
                parsed.group_name,
                parsed.installment_index,
                parsed.installment_count,
                parsed.responsible,
                parsed.payment_method.map(|m| m.as_str()),
                parsed.card,
                parsed.status.as_str(),
                id,
            ],
        )?;
        updated += 1;
    }

    if updated > 0 {
        let event = Event::new(
            "legacy_labels_migrated",
            "ledger",
            "all",
            serde_json::json!({ "rows": updated }),
            "migration",
        );
        insert_event(&tx, &event)?;
    }
    tx.commit()?;

    Ok(updated)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn sample_entry(date: &str, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id: 0,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: "Mercado | 👤 Geral | 💰 Pix | Paga".to_string(),
            category: "Alimentação".to_string(),
            amount,
            movement: MovementType::Despesa,
            cost_type: CostType::Variavel,
            group_kind: Some(GroupKind::Despesa),
            group_id: Some(uuid::Uuid::new_v4().to_string()),
            group_name: Some("Mercado".to_string()),
            installment_index: 1,
            installment_count: 1,
            responsible: Some("Geral".to_string()),
            payment_method: Some(PaymentMethod::Pix),
            card: None,
            status: EntryStatus::Paga,
        }
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let conn = test_conn();

        let entry = sample_entry("2026-03-15", 250.40);
        let id = insert_entry(&conn, &entry).unwrap();
        assert!(id > 0);

        let loaded = get_entry(&conn, id).unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.date, entry.date);
        assert_eq!(loaded.amount, 250.40);
        assert_eq!(loaded.movement, MovementType::Despesa);
        assert_eq!(loaded.cost_type, CostType::Variavel);
        assert_eq!(loaded.group_kind, Some(GroupKind::Despesa));
        assert_eq!(loaded.payment_method, Some(PaymentMethod::Pix));
        assert_eq!(loaded.status, EntryStatus::Paga);
    }

    #[test]
    fn test_get_missing_entry_is_reference_error() {
        let conn = test_conn();
        let err = get_entry(&conn, 999).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Reference(ReferenceError::EntryNotFound(999))
        ));
    }

    #[test]
    fn test_entries_for_month_bounds() {
        let conn = test_conn();
        insert_entry(&conn, &sample_entry("2026-02-28", 10.0)).unwrap();
        insert_entry(&conn, &sample_entry("2026-03-01", 20.0)).unwrap();
        insert_entry(&conn, &sample_entry("2026-03-31", 30.0)).unwrap();
        insert_entry(&conn, &sample_entry("2026-04-01", 40.0)).unwrap();

        let march = entries_for_month(&conn, 2026, 3).unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].amount, 20.0);
        assert_eq!(march[1].amount, 30.0);
    }

    #[test]
    fn test_month_bounds_december_rolls_year() {
        assert_eq!(
            month_bounds(2026, 12),
            ("2026-12-01".to_string(), "2027-01-01".to_string())
        );
    }

    #[test]
    fn test_is_counted() {
        let mut entry = sample_entry("2026-01-01", 100.0);
        assert!(!entry.is_counted());

        entry.group_kind = Some(GroupKind::Meta);
        assert!(entry.is_counted());

        entry.group_kind = Some(GroupKind::Divida);
        entry.status = EntryStatus::Pendente;
        assert!(!entry.is_counted());
        entry.status = EntryStatus::Paga;
        assert!(entry.is_counted());
    }

    #[test]
    fn test_event_log() {
        let conn = test_conn();

        let event = Event::new(
            "payment_confirmed",
            "ledger_entry",
            "7",
            serde_json::json!({"amount": 1000.0}),
            "reconciler",
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "ledger_entry", "7").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "payment_confirmed");
        assert_eq!(events[0].actor, "reconciler");
    }

    #[test]
    fn test_migrate_legacy_labels_backfills_columns() {
        let mut conn = test_conn();

        // Legacy row: linkage lives only inside the description text.
        conn.execute(
            "INSERT INTO ledger_entries (date, description, category, amount, movement_type, cost_type)
             VALUES ('2026-01-10', 'Dívida: Carro (2/12) | 👤 Ana | Pendente', 'Dívidas', 1000.0, 'Despesa', 'Dívida')",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();

        let updated = migrate_legacy_labels(&mut conn).unwrap();
        assert_eq!(updated, 1);

        let entry = get_entry(&conn, id).unwrap();
        assert_eq!(entry.group_kind, Some(GroupKind::Divida));
        assert_eq!(entry.group_name.as_deref(), Some("Carro"));
        assert_eq!(entry.installment_index, 2);
        assert_eq!(entry.installment_count, 12);
        assert_eq!(entry.responsible.as_deref(), Some("Ana"));
        assert_eq!(entry.status, EntryStatus::Pendente);

        // Idempotent: second run touches nothing.
        let updated = migrate_legacy_labels(&mut conn).unwrap();
        assert_eq!(updated, 0);
    }
}
