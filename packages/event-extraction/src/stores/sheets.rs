//! Google Sheets row store.

use async_trait::async_trait;
use sheets_client::{SheetsClient, SheetsError};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{QueuedUrl, RowStore};

/// [`RowStore`] over one Google spreadsheet; sheet names are tab titles.
#[derive(Clone)]
pub struct SheetsRowStore {
    client: SheetsClient,
}

impl SheetsRowStore {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }
}

fn store_error(e: SheetsError) -> StoreError {
    match e {
        SheetsError::SheetNotFound(sheet) => StoreError::UnknownSheet(sheet),
        other => StoreError::Backend(Box::new(other)),
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn append_row(&self, sheet: &str, row: Vec<String>) -> StoreResult<()> {
        self.client.append_row(sheet, &row).await.map_err(store_error)
    }

    async fn delete_row(&self, sheet: &str, row_number: usize) -> StoreResult<()> {
        if row_number == 0 {
            return Err(StoreError::RowOutOfRange {
                sheet: sheet.to_string(),
                row: row_number,
            });
        }
        self.client
            .delete_row(sheet, row_number)
            .await
            .map_err(store_error)
    }

    async fn queued_urls(&self, sheet: &str) -> StoreResult<Vec<QueuedUrl>> {
        let column = self.client.get_column(sheet).await.map_err(store_error)?;
        let queued = queued_cells(&column);
        debug!(sheet = %sheet, rows = column.len(), queued = queued.len(), "Read queue column");
        Ok(queued)
    }
}

/// Non-empty cells below the header, with their 1-based rows.
fn queued_cells(column: &[String]) -> Vec<QueuedUrl> {
    column
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cell)| !cell.trim().is_empty())
        .map(|(index, cell)| QueuedUrl {
            url: cell.trim().to_string(),
            row: index + 1,
        })
        .collect()
}
