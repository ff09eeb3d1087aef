// 📤 Ledger Export - one month of cash flow as CSV
//
// File-boundary module: errors carry io context instead of the core
// taxonomy, since nothing here touches aggregates.

use crate::db::{self, entries_for_month};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::io::Write;
use std::path::Path;

const HEADERS: &[&str] = &[
    "date",
    "description",
    "category",
    "amount",
    "movement_type",
    "cost_type",
    "status",
];

/// Write the month's ledger as CSV into any writer. Returns the row count.
pub fn write_month_csv<W: Write>(
    conn: &Connection,
    year: i32,
    month: u32,
    writer: W,
) -> Result<usize> {
    let entries = entries_for_month(conn, year, month)?;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS)
        .context("Failed to write CSV header")?;

    for entry in &entries {
        wtr.write_record(&[
            db::date_to_sql(entry.date),
            entry.description.clone(),
            entry.category.clone(),
            format!("{:.2}", entry.amount),
            entry.movement.as_str().to_string(),
            entry.cost_type.as_str().to_string(),
            entry.status.as_str().to_string(),
        ])
        .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(entries.len())
}

/// Write the month's ledger to a CSV file at `csv_path`.
pub fn export_month_csv(
    conn: &Connection,
    year: i32,
    month: u32,
    csv_path: &Path,
) -> Result<usize> {
    let file = std::fs::File::create(csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    write_month_csv(conn, year, month, file)
}
