//! Row-oriented store for the input queue and the output ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A URL waiting in the input queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUrl {
    pub url: String,
    /// 1-based sheet row, used to delete the entry once confirmed
    pub row: usize,
}

/// Append/delete row store backing the queue and ledger sheets.
///
/// Row numbers are 1-based; row 1 of a queue sheet is its header.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn append_row(&self, sheet: &str, row: Vec<String>) -> StoreResult<()>;

    async fn delete_row(&self, sheet: &str, row_number: usize) -> StoreResult<()>;

    /// Every non-empty URL cell in column A below the header, top to bottom.
    async fn queued_urls(&self, sheet: &str) -> StoreResult<Vec<QueuedUrl>>;

    /// First non-empty URL cell in column A below the header.
    async fn next_queued_url(&self, sheet: &str) -> StoreResult<Option<QueuedUrl>> {
        Ok(self.queued_urls(sheet).await?.into_iter().next())
    }
}
