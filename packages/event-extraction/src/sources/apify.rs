//! Browser-rendered scraping through Apify's website-content-crawler.

use apify_client::{ApifyClient, WebsiteContentCrawlerInput, WebsiteContentItem};
use async_trait::async_trait;
use tracing::info;

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{ScrapedPage, UrlSource};

/// Text handed on when the crawl produced no pages.
pub const NO_CONTENT: &str = "No content found.";

/// URL source backed by a headless Firefox crawl on Apify.
///
/// Handles JavaScript-heavy event pages that [`HttpUrlSource`](super::HttpUrlSource)
/// cannot render.
pub struct ApifyUrlSource {
    client: ApifyClient,
    max_crawl_pages: u32,
    max_crawl_depth: u32,
}

impl ApifyUrlSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(ApifyClient::new(token.into()))
    }

    pub fn with_client(client: ApifyClient) -> Self {
        Self {
            client,
            max_crawl_pages: 50,
            max_crawl_depth: 2,
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

/// The requested page out of the crawled items: the item for `url` when
/// present, else the first one.
fn page_from_items(url: &str, items: Vec<WebsiteContentItem>) -> ScrapedPage {
    let position = items
        .iter()
        .position(|item| item.url.trim_end_matches('/') == url.trim_end_matches('/'))
        .unwrap_or(0);

    let Some(item) = items.into_iter().nth(position) else {
        return ScrapedPage::new(url, NO_CONTENT);
    };

    let mut page = ScrapedPage::new(url, item.text.unwrap_or_default());
    if let Some(title) = item.metadata.and_then(|m| m.title) {
        page = page.with_title(title);
    }
    if let Some(html) = item.html {
        page = page.with_html(html);
    }
    page
}

#[async_trait]
impl UrlSource for ApifyUrlSource {
    async fn fetch_page(&self, url: &str) -> SourceResult<ScrapedPage> {
        info!(url = %url, "Scraping URL with Apify");

        let input = WebsiteContentCrawlerInput::for_url(url)
            .with_max_crawl_pages(self.max_crawl_pages)
            .with_max_crawl_depth(self.max_crawl_depth);

        let items = self
            .client
            .crawl(&input)
            .await
            .map_err(|e| SourceError::Scraper(Box::new(e)))?;

        Ok(page_from_items(url, items))
    }

    fn name(&self) -> &str {
        "apify"
    }
}
