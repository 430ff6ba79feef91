//! In-memory row store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{QueuedUrl, RowStore};

/// Sheets held in process memory.
///
/// Sheets are created on first append. Row numbers are 1-based; queue sheets
/// are expected to carry a header in row 1.
#[derive(Default)]
pub struct MemoryRowStore {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sheet with rows (builder style, for tests and demos).
    pub fn with_sheet(self, sheet: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        if let Ok(mut sheets) = self.sheets.write() {
            sheets.insert(sheet.into(), rows);
        }
        self
    }

    /// Snapshot of a sheet's rows.
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.sheets
            .read()
            .ok()
            .and_then(|sheets| sheets.get(sheet).cloned())
            .unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("row store lock poisoned".into())
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn append_row(&self, sheet: &str, row: Vec<String>) -> StoreResult<()> {
        let mut sheets = self.sheets.write().map_err(|_| poisoned())?;
        sheets.entry(sheet.to_string()).or_default().push(row);
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row_number: usize) -> StoreResult<()> {
        let mut sheets = self.sheets.write().map_err(|_| poisoned())?;
        let rows = sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::UnknownSheet(sheet.to_string()))?;

        if row_number == 0 || row_number > rows.len() {
            return Err(StoreError::RowOutOfRange {
                sheet: sheet.to_string(),
                row: row_number,
            });
        }
        rows.remove(row_number - 1);
        Ok(())
    }

    async fn queued_urls(&self, sheet: &str) -> StoreResult<Vec<QueuedUrl>> {
        let sheets = self.sheets.read().map_err(|_| poisoned())?;
        let Some(rows) = sheets.get(sheet) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, row)| {
                let cell = row.first()?.trim();
                (!cell.is_empty()).then(|| QueuedUrl {
                    url: cell.to_string(),
                    row: index + 1,
                })
            })
            .collect())
    }
}
