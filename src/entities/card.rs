// 💳 Card Entities - credit cards (closing/due day rules) and benefit cards
//
// The credit card's closing/due days drive the reference-date rule in
// `schedule::credit_reference_date`.

use crate::error::{ReferenceError, Result, ValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: i64,
    pub name: String,
    pub card_limit: Option<f64>,
    pub closing_day: u32,
    pub due_day: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitCard {
    pub id: i64,
    pub name: String,
    pub balance: f64,
}

fn check_day(day: u32) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(ValidationError::InvalidCardDay(day).into());
    }
    Ok(())
}

pub fn create_credit_card(
    conn: &Connection,
    name: &str,
    card_limit: Option<f64>,
    closing_day: u32,
    due_day: u32,
) -> Result<CreditCard> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    check_day(closing_day)?;
    check_day(due_day)?;

    conn.execute(
        "INSERT INTO credit_cards (name, card_limit, closing_day, due_day) VALUES (?1, ?2, ?3, ?4)",
        params![name.trim(), card_limit, closing_day, due_day],
    )?;

    Ok(CreditCard {
        id: conn.last_insert_rowid(),
        name: name.trim().to_string(),
        card_limit,
        closing_day,
        due_day,
    })
}

fn map_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<CreditCard> {
    Ok(CreditCard {
        id: row.get(0)?,
        name: row.get(1)?,
        card_limit: row.get(2)?,
        closing_day: row.get::<_, i64>(3)? as u32,
        due_day: row.get::<_, i64>(4)? as u32,
    })
}

/// Card lookup used by the expander; missing cards abort the expansion.
pub fn find_card_by_name(conn: &Connection, name: &str) -> Result<CreditCard> {
    conn.query_row(
        "SELECT id, name, card_limit, closing_day, due_day FROM credit_cards WHERE name = ?1",
        params![name],
        map_card,
    )
    .optional()?
    .ok_or_else(|| ReferenceError::CardNotFound(name.to_string()).into())
}

pub fn list_credit_cards(conn: &Connection) -> Result<Vec<CreditCard>> {
    let mut stmt = conn
        .prepare("SELECT id, name, card_limit, closing_day, due_day FROM credit_cards ORDER BY name")?;
    let cards = stmt
        .query_map([], map_card)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

pub fn delete_credit_card(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM credit_cards WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn create_benefit_card(conn: &Connection, name: &str, balance: f64) -> Result<BenefitCard> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }

    conn.execute(
        "INSERT INTO benefit_cards (name, balance) VALUES (?1, ?2)",
        params![name.trim(), balance],
    )?;

    Ok(BenefitCard {
        id: conn.last_insert_rowid(),
        name: name.trim().to_string(),
        balance,
    })
}

pub fn list_benefit_cards(conn: &Connection) -> Result<Vec<BenefitCard>> {
    let mut stmt = conn.prepare("SELECT id, name, balance FROM benefit_cards ORDER BY name")?;
    let cards = stmt
        .query_map([], |row| {
            Ok(BenefitCard {
                id: row.get(0)?,
                name: row.get(1)?,
                balance: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_find_card() {
        let conn = test_conn();
        let card = create_credit_card(&conn, "Nubank", Some(8000.0), 25, 5).unwrap();
        assert!(card.id > 0);

        let loaded = find_card_by_name(&conn, "Nubank").unwrap();
        assert_eq!(loaded.closing_day, 25);
        assert_eq!(loaded.due_day, 5);
        assert_eq!(loaded.card_limit, Some(8000.0));
    }

    #[test]
    fn test_card_day_validation() {
        let conn = test_conn();
        assert!(create_credit_card(&conn, "X", None, 0, 5).is_err());
        assert!(create_credit_card(&conn, "X", None, 25, 32).is_err());
        assert!(create_credit_card(&conn, "", None, 25, 5).is_err());
    }

    #[test]
    fn test_missing_card_is_reference_error() {
        let conn = test_conn();
        let err = find_card_by_name(&conn, "Inexistente").unwrap_err();
        assert!(err.to_string().contains("Inexistente"));
    }

    #[test]
    fn test_benefit_card_roundtrip() {
        let conn = test_conn();
        create_benefit_card(&conn, "Vale Alimentação", 600.0).unwrap();

        let cards = list_benefit_cards(&conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].balance, 600.0);
    }
}
