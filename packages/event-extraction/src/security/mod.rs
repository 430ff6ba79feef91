//! SSRF protection for URL-based sources.
//!
//! Links and image references found in submitted text are attacker
//! controlled, so every outbound fetch goes through [`UrlValidator`].

mod url_validator;

pub use url_validator::UrlValidator;
