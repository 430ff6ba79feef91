//! Error types for the Sheets client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetsError>;

#[derive(Debug, Error)]
pub enum SheetsError {
    /// Credentials file missing or unreadable
    #[error("Sheets credentials error: {0}")]
    Credentials(String),

    /// Signing the token grant failed
    #[error("Failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the OAuth or Sheets endpoints
    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Sheet (tab) title not found in the spreadsheet
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Failed to parse Sheets response: {0}")]
    Parse(#[from] serde_json::Error),
}
