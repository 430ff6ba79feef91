use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for the apify/website-content-crawler actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteContentCrawlerInput {
    pub start_urls: Vec<StartUrl>,
    /// e.g. `playwright:firefox` for full JavaScript rendering
    pub crawler_type: String,
    pub use_sitemaps: bool,
    pub max_crawl_pages: u32,
    /// 0 crawls the start URLs only
    pub max_crawl_depth: u32,
    /// Wait condition before the page is captured, e.g. `networkidle`
    pub wait_for: String,
    /// Pixels to scroll for lazily loaded content
    pub max_scroll_height: u32,
    pub remove_cookie_warnings: bool,
    /// Keep the page HTML on each dataset item
    pub save_html: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartUrl {
    pub url: String,
}

impl WebsiteContentCrawlerInput {
    /// Browser-rendered crawl rooted at `url`.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            start_urls: vec![StartUrl { url: url.into() }],
            crawler_type: "playwright:firefox".to_string(),
            use_sitemaps: true,
            max_crawl_pages: 50,
            max_crawl_depth: 2,
            wait_for: "networkidle".to_string(),
            max_scroll_height: 5000,
            remove_cookie_warnings: true,
            save_html: true,
        }
    }

    pub fn with_max_crawl_pages(mut self, pages: u32) -> Self {
        self.max_crawl_pages = pages;
        self
    }

    pub fn with_max_crawl_depth(mut self, depth: u32) -> Self {
        self.max_crawl_depth = depth;
        self
    }
}

/// A single crawled page from the website-content-crawler dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteContentItem {
    pub url: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub markdown: Option<String>,
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "languageCode")]
    pub language_code: Option<String>,
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}
