//! Minimal Google Sheets v4 client
//!
//! Covers the handful of calls a row ledger needs: append a row, read a
//! column, and delete a row. Authenticates as a service account.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheets_client::SheetsClient;
//!
//! let client = SheetsClient::from_service_account_file("creds.json", "spreadsheet-id")?;
//! client.append_row("Events", &["2025-06-05 10:00:00".to_string()]).await?;
//! let urls = client.get_column("Queue").await?;
//! ```

pub mod auth;
pub mod error;
pub mod types;

pub use auth::TokenProvider;
pub use error::{Result, SheetsError};
pub use types::{ServiceAccountKey, ValueRange};

use std::path::Path;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets client bound to one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    tokens: Arc<TokenProvider>,
    spreadsheet_id: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(tokens: TokenProvider, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            tokens: Arc::new(tokens),
            spreadsheet_id: spreadsheet_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_service_account_file(
        path: impl AsRef<Path>,
        spreadsheet_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(TokenProvider::from_file(path)?, spreadsheet_id))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.spreadsheet_id, suffix)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.tokens.access_token(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;
        let body = check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Append one row after the last non-empty row of `sheet`.
    ///
    /// Cells are written verbatim, so `05.06.25` stays text and a leading `=`
    /// is never evaluated as a formula.
    pub async fn append_row(&self, sheet: &str, cells: &[String]) -> Result<()> {
        let url = self.url(&append_path(sheet));

        let _: serde_json::Value = self
            .send(self.http.post(url).json(&json!({ "values": [cells] })))
            .await?;

        debug!(sheet = %sheet, cells = cells.len(), "Appended row");
        Ok(())
    }

    /// Every value of column A, top to bottom. Blank trailing rows are omitted
    /// by the API; blank cells inside the range come back as "".
    pub async fn get_column(&self, sheet: &str) -> Result<Vec<String>> {
        let range = urlencoding::encode(&format!("{}!A:A", sheet)).into_owned();
        let values: ValueRange = self
            .send(self.http.get(self.url(&format!("/values/{}", range))))
            .await?;

        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    /// Numeric id of the sheet titled `sheet`.
    pub async fn sheet_id(&self, sheet: &str) -> Result<i64> {
        let meta: types::SpreadsheetMeta = self
            .send(self.http.get(self.url("?fields=sheets.properties")))
            .await?;

        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == sheet)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| SheetsError::SheetNotFound(sheet.to_string()))
    }

    /// Delete the 1-based `row` of `sheet`, shifting later rows up.
    pub async fn delete_row(&self, sheet: &str, row: usize) -> Result<()> {
        let sheet_id = self.sheet_id(sheet).await?;
        let request = delete_row_request(sheet_id, row);

        let _: serde_json::Value = self
            .send(self.http.post(self.url(":batchUpdate")).json(&request))
            .await?;

        debug!(sheet = %sheet, row, "Deleted row");
        Ok(())
    }
}

fn append_path(sheet: &str) -> String {
    let range = urlencoding::encode(&format!("{}!A1", sheet)).into_owned();
    format!(
        "/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        range
    )
}

fn delete_row_request(sheet_id: i64, row: usize) -> serde_json::Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row.saturating_sub(1),
                    "endIndex": row,
                }
            }
        }]
    })
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!(status = %status, error = %message, "Sheets API error");
    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_path_writes_raw_values() {
        let path = append_path("Event List");

        assert!(path.starts_with("/values/Event%20List%21A1:append?"));
        assert!(path.contains("valueInputOption=RAW"));
        assert!(!path.contains("USER_ENTERED"));
    }

    #[test]
    fn test_delete_row_request_is_zero_based() {
        let request = delete_row_request(7, 3);
        let range = &request["requests"][0]["deleteDimension"]["range"];

        assert_eq!(range["sheetId"], 7);
        assert_eq!(range["dimension"], "ROWS");
        assert_eq!(range["startIndex"], 2);
        assert_eq!(range["endIndex"], 3);
    }
}
