use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;

/// Which URL scraper backs the URL pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScraperBackend {
    /// Apify website-content-crawler (headless browser)
    Apify,
    /// Plain HTTP fetch, no JavaScript
    Http,
}

impl FromStr for ScraperBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apify" => Ok(Self::Apify),
            "http" => Ok(Self::Http),
            other => bail!("SCRAPER_BACKEND must be 'apify' or 'http', got '{}'", other),
        }
    }
}

/// Request body cap for `/run`, sized for base64 PDFs and photos.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Google Sheets coordinates for the queue and ledger.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub service_account_path: String,
    pub sheet_id: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: String,
    pub scraper_backend: ScraperBackend,
    pub apify_api_key: Option<String>,
    /// None when either Sheets variable is missing
    pub sheets: Option<SheetsConfig>,
    pub queue_sheet: String,
    pub ledger_sheet: String,
    pub schema_file: String,
    pub tesseract_path: String,
    pub ocr_languages: String,
    pub sub_extraction_timeout: Duration,
    pub pending_ttl: Duration,
    pub pending_capacity: usize,
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let apify_api_key = optional("APIFY_API_KEY");
        let scraper_backend = match optional("SCRAPER_BACKEND") {
            Some(value) => value.parse()?,
            None if apify_api_key.is_some() => ScraperBackend::Apify,
            None => ScraperBackend::Http,
        };
        if scraper_backend == ScraperBackend::Apify && apify_api_key.is_none() {
            bail!("APIFY_API_KEY must be set when SCRAPER_BACKEND=apify");
        }

        let sheets = match (
            optional("GOOGLE_SERVICE_ACCOUNT_PATH"),
            optional("GOOGLE_SHEET_ID"),
        ) {
            (Some(service_account_path), Some(sheet_id)) => Some(SheetsConfig {
                service_account_path,
                sheet_id,
            }),
            _ => None,
        };

        Ok(Self {
            port: parsed("PORT", 5000)?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model: or_default("OPENAI_MODEL", "gpt-4o"),
            scraper_backend,
            apify_api_key,
            sheets,
            queue_sheet: or_default("QUEUE_SHEET", "Queue"),
            ledger_sheet: or_default("LEDGER_SHEET", "Events"),
            schema_file: or_default("SCHEMA_FILE", "event_details_schema.json"),
            tesseract_path: or_default("TESSERACT_PATH", "tesseract"),
            ocr_languages: or_default("OCR_LANGUAGES", "heb+eng"),
            sub_extraction_timeout: Duration::from_secs(parsed("SUB_EXTRACTION_TIMEOUT_SECS", 90)?),
            pending_ttl: Duration::from_secs(parsed("PENDING_TTL_SECS", 3600)?),
            pending_capacity: parsed("PENDING_CAPACITY", 256)?,
            allowed_origins: parse_origins(
                &or_default("ALLOWED_ORIGINS", "http://localhost:5000"),
            ),
            max_body_bytes: parsed("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

/// Set and non-blank, trimmed.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_backend_parse() {
        assert_eq!("apify".parse::<ScraperBackend>().unwrap(), ScraperBackend::Apify);
        assert_eq!(" HTTP ".parse::<ScraperBackend>().unwrap(), ScraperBackend::Http);
        assert!("firecrawl".parse::<ScraperBackend>().is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:5000, https://events.example,,"),
            vec!["http://localhost:5000", "https://events.example"]
        );
    }
}
