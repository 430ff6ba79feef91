//! Pure Apify REST API client.
//!
//! A minimal client for the Apify platform API. Supports starting actor runs,
//! polling for completion, and fetching dataset results.
//!
//! # Example
//!
//! ```rust,ignore
//! use apify_client::ApifyClient;
//!
//! let client = ApifyClient::new("your-api-token".into());
//!
//! let pages = client.scrape_website_content("https://events.example/summit").await?;
//! if let Some(page) = pages.first() {
//!     println!("{}", page.text.as_deref().unwrap_or("(no text)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{PageMetadata, RunData, StartUrl, WebsiteContentCrawlerInput, WebsiteContentItem};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for apify/website-content-crawler.
const WEBSITE_CONTENT_CRAWLER: &str = "apify~website-content-crawler";

pub struct ApifyClient {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApifyError::Api {
        status: status.as_u16(),
        message: body,
    })
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: SecretString::from(token),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at another API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(input)
            .send()
            .await?;

        let api_resp: ApiResponse<RunData> = check_status(resp).await?.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient long-polling.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(self.token.expose_secret())
                .send()
                .await?;

            let api_resp: ApiResponse<RunData> = check_status(resp).await?.json().await?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(api_resp.data.status));
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let body = check_status(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Crawl a website end-to-end: start run, poll, fetch the crawled pages.
    ///
    /// The start URL's page is normally the first item.
    pub async fn scrape_website_content(&self, url: &str) -> Result<Vec<WebsiteContentItem>> {
        self.crawl(&WebsiteContentCrawlerInput::for_url(url)).await
    }

    /// Like [`scrape_website_content`](Self::scrape_website_content) with a
    /// caller-built input.
    pub async fn crawl(&self, input: &WebsiteContentCrawlerInput) -> Result<Vec<WebsiteContentItem>> {
        tracing::info!(
            start_urls = input.start_urls.len(),
            max_pages = input.max_crawl_pages,
            "Starting website content crawl"
        );

        let run = self.start_run(WEBSITE_CONTENT_CRAWLER, input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let pages: Vec<WebsiteContentItem> = self
            .get_dataset_items(&completed.default_dataset_id)
            .await?;
        tracing::info!(count = pages.len(), "Fetched crawled pages");

        Ok(pages)
    }
}
