//! Plain HTTP sources.
//!
//! [`HttpUrlSource`] is the lightweight scraper: no JavaScript rendering,
//! suitable for static event pages. For JavaScript-heavy sites use
//! `ApifyUrlSource` instead.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{BinaryFetcher, ScrapedPage, UrlSource};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

lazy_static! {
    static ref SCRIPT_REGEX: Regex = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    static ref STYLE_REGEX: Regex = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    static ref COMMENT_REGEX: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref BLOCK_END_REGEX: Regex =
        Regex::new(r"(?i)</(p|div|h[1-6]|li|tr|section|article|header|footer)>|<br\s*/?>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SPACES_REGEX: Regex = Regex::new(r"[ \t\r\f]+").unwrap();
    static ref BLANK_LINES_REGEX: Regex = Regex::new(r"\n\s*\n+").unwrap();
    static ref TITLE_REGEX: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
}

fn build_client() -> SourceResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SourceError::Http(Box::new(e)))
}

async fn get_checked(client: &reqwest::Client, url: &str) -> SourceResult<reqwest::Response> {
    let response = client.get(url).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "HTTP request failed");
        SourceError::Http(Box::new(e))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// Scrapes a page with a single GET and strips it down to readable text.
///
/// The raw HTML is kept on the page so embedded images can be found.
pub struct HttpUrlSource {
    client: reqwest::Client,
}

impl HttpUrlSource {
    pub fn new() -> SourceResult<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlSource for HttpUrlSource {
    async fn fetch_page(&self, url: &str) -> SourceResult<ScrapedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let html = get_checked(&self.client, url)
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Http(Box::new(e)))?;

        let mut page = ScrapedPage::new(url, html_to_text(&html));
        if let Some(title) = extract_title(&html) {
            page = page.with_title(title);
        }
        debug!(url = %url, chars = page.text.len(), "HTTP fetch complete");

        Ok(page.with_html(html))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Downloads binary payloads such as event posters.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> SourceResult<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BinaryFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        let bytes = get_checked(&self.client, url)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::Http(Box::new(e)))?;

        debug!(url = %url, bytes = bytes.len(), "Downloaded payload");
        Ok(bytes.to_vec())
    }
}

/// Reduce an HTML document to readable text.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_REGEX.replace_all(html, "");
    let text = STYLE_REGEX.replace_all(&text, "");
    let text = COMMENT_REGEX.replace_all(&text, "");
    let text = BLOCK_END_REGEX.replace_all(&text, "\n");
    let text = TAG_REGEX.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = SPACES_REGEX.replace_all(&text, " ");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    BLANK_LINES_REGEX
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn extract_title(html: &str) -> Option<String> {
    TITLE_REGEX
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty())
}
