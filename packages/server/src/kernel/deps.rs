//! Server dependencies for the route handlers (using traits for testability)
//!
//! Concrete extractors are picked from [`Config`] by explicit construction;
//! tests build a [`ServerDeps`] from mocks instead.

use std::sync::Arc;

use anyhow::{Context, Result};
use event_extraction::{
    ApifyUrlSource, Extractors, FieldSchema, HttpFetcher, HttpUrlSource, LopdfText,
    MemoryRowStore, OpenAIFieldExtractor, Orchestrator, RowStore, SheetsRowStore, TesseractOcr,
    UrlSource, ValidatedFetcher, ValidatedUrlSource, WorkflowConfig,
};
use sheets_client::SheetsClient;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::common::PendingRecords;
use crate::config::{Config, ScraperBackend};

/// Server dependencies accessible to handlers
#[derive(Clone)]
pub struct ServerDeps {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn RowStore>,
    pub pending: Arc<PendingRecords>,
    /// Serializes queue reads and row deletes, which address rows by position
    pub queue_lock: Arc<Mutex<()>>,
    pub queue_sheet: String,
    pub ledger_sheet: String,
}

impl ServerDeps {
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn RowStore>,
        pending: PendingRecords,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            pending: Arc::new(pending),
            queue_lock: Arc::new(Mutex::new(())),
            queue_sheet: "Queue".to_string(),
            ledger_sheet: "Events".to_string(),
        }
    }

    pub fn with_sheets(mut self, queue_sheet: impl Into<String>, ledger_sheet: impl Into<String>) -> Self {
        self.queue_sheet = queue_sheet.into();
        self.ledger_sheet = ledger_sheet.into();
        self
    }

    /// Build production dependencies from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let orchestrator = Orchestrator::new(
            build_extractors(config)?,
            Arc::new(FieldSchema::load(&config.schema_file)),
        )
        .with_config(
            WorkflowConfig::default().with_sub_extraction_timeout(config.sub_extraction_timeout),
        );

        Ok(Self::new(
            orchestrator,
            build_store(config)?,
            PendingRecords::new(config.pending_ttl, config.pending_capacity),
        )
        .with_sheets(&config.queue_sheet, &config.ledger_sheet))
    }
}

fn build_extractors(config: &Config) -> Result<Extractors> {
    // URL-based capabilities see untrusted input, so both go through SSRF validation
    let url: Arc<dyn UrlSource> = match (config.scraper_backend, &config.apify_api_key) {
        (ScraperBackend::Apify, Some(token)) => {
            info!("Using Apify website-content-crawler for URLs");
            Arc::new(ValidatedUrlSource::new(ApifyUrlSource::new(token.clone())))
        }
        _ => {
            info!("Using plain HTTP scraping for URLs");
            Arc::new(ValidatedUrlSource::new(
                HttpUrlSource::new().context("Failed to build HTTP scraper")?,
            ))
        }
    };

    let fetcher = ValidatedFetcher::new(HttpFetcher::new().context("Failed to build HTTP fetcher")?);

    let ocr = TesseractOcr::new()
        .with_binary(&config.tesseract_path)
        .with_languages(&config.ocr_languages);

    let fields = OpenAIFieldExtractor::new(config.openai_api_key.clone())
        .with_model(&config.openai_model);

    Ok(Extractors {
        url,
        image: Arc::new(ocr),
        pdf: Arc::new(LopdfText::new()),
        fetcher: Arc::new(fetcher),
        fields: Arc::new(fields),
    })
}

fn build_store(config: &Config) -> Result<Arc<dyn RowStore>> {
    match &config.sheets {
        Some(sheets) => {
            let client = SheetsClient::from_service_account_file(
                &sheets.service_account_path,
                &sheets.sheet_id,
            )
            .context("Failed to load Google service account")?;
            info!(spreadsheet = %sheets.sheet_id, "Using Google Sheets row store");
            Ok(Arc::new(SheetsRowStore::new(client)))
        }
        None => {
            warn!("Google Sheets not configured, confirmed records are kept in memory only");
            Ok(Arc::new(MemoryRowStore::new()))
        }
    }
}
