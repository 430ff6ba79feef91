//! URL classification and link discovery.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::types::result::WorkflowResult;

lazy_static! {
    // Absolute http(s) URL: unreserved, reserved and percent-encoded characters.
    // Quotes and angle brackets end a match so links inside markup come out clean.
    static ref LINK_REGEX: Regex =
        Regex::new(r"(?i)https?://[A-Za-z0-9\-._~:/?#\[\]@!$&()*+,;=%]+").unwrap();

    static ref IMG_SRC_REGEX: Regex =
        Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap();
}

/// Sentence punctuation that commonly trails a link in prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

fn raw_links(text: &str) -> impl Iterator<Item = &str> {
    LINK_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// True when `url` parses as an absolute URL with both scheme and host.
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Normalize a link candidate.
///
/// Inserts `https://` when no scheme is given, lower-cases scheme and
/// authority, drops the fragment and keeps path and query untouched. No
/// trailing slash is added. Returns `None` for candidates without a host.
pub fn normalize_url(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let absolute = if has_http_scheme(candidate) {
        candidate.to_string()
    } else {
        format!("https://{}", candidate)
    };
    if !is_valid_url(&absolute) {
        return None;
    }

    let (scheme, rest) = absolute.split_once("://")?;
    let rest = rest.split('#').next().unwrap_or(rest);
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    Some(format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        authority.to_lowercase(),
        tail
    ))
}

/// Return the normalized URL when the whole trimmed text is exactly one
/// absolute URL and nothing else.
pub fn classify_url_only(text: &str) -> Option<String> {
    let cleaned = text.trim();
    if cleaned.is_empty() || !is_valid_url(cleaned) {
        return None;
    }

    // Untrimmed matches: a URL ending in punctuation is still the whole text.
    let mut links = LINK_REGEX.find_iter(cleaned);
    match (links.next(), links.next()) {
        (Some(only), None) if only.as_str() == cleaned => normalize_url(cleaned),
        _ => None,
    }
}

/// Every http(s) link in `text`, normalized, in order of appearance.
///
/// Duplicates are kept; invalid candidates are dropped silently.
pub fn extract_links(text: &str) -> Vec<String> {
    raw_links(text).filter_map(normalize_url).collect()
}

/// Collect the links discovered by depth-0 results for the depth-1 pass.
///
/// First occurrence wins, and URLs in `already_processed` are skipped.
pub fn discover_links(results: &[WorkflowResult], already_processed: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for url in results.iter().flat_map(WorkflowResult::discovered) {
        if already_processed.contains(url) || seen.contains(url) {
            continue;
        }
        seen.push(url.clone());
    }
    seen
}

/// `<img src>` references in page markup, resolved against `base_url`.
///
/// Absolute http(s) sources and inline `data:image` URIs are kept as
/// written. Relative ones are joined to the page URL and dropped when that
/// fails.
pub fn extract_image_urls(markup: &str, base_url: &str) -> Vec<String> {
    let base = Url::parse(base_url).ok();

    IMG_SRC_REGEX
        .captures_iter(markup)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|src| !src.is_empty())
        .filter_map(|src| {
            if has_http_scheme(src) || src.starts_with("data:image") {
                Some(src.to_string())
            } else {
                base.as_ref()?.join(src).ok().map(String::from)
            }
        })
        .collect()
}
