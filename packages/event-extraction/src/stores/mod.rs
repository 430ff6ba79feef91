//! Row store implementations and the ledger row layout.
//!
//! - [`MemoryRowStore`] - in-process sheets, for tests and unconfigured servers
//! - `SheetsRowStore` - Google Sheets (feature `sheets`)

pub mod memory;

#[cfg(feature = "sheets")]
pub mod sheets;

pub use memory::MemoryRowStore;

#[cfg(feature = "sheets")]
pub use sheets::SheetsRowStore;

use chrono::NaiveDateTime;

use crate::types::record::{EventField, EventRecord};

/// Status cell written for every confirmed record.
pub const LEDGER_STATUS: &str = "Success";

/// One ledger row for a confirmed record.
///
/// Layout: timestamp, source, one cell per record field in column order,
/// the record's annotation, the status cell, and an empty trailing cell.
pub fn ledger_row(record: &EventRecord, source: &str, timestamp: NaiveDateTime) -> Vec<String> {
    let mut row = Vec::with_capacity(EventField::ALL.len() + 5);
    row.push(timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
    row.push(source.to_string());

    row.extend(EventField::ALL.iter().map(|&field| {
        record
            .get(field)
            .map(|value| value.to_cell())
            .unwrap_or_default()
    }));

    row.push(record.error.clone().unwrap_or_default());
    row.push(LEDGER_STATUS.to_string());
    row.push(String::new());
    row
}
