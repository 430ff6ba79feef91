use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Apify API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Actor run ended with status {0}")]
    RunFailed(String),

    #[error("Failed to parse Apify response: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApifyError>;
