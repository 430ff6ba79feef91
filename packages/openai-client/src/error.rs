//! Error types for the OpenAI client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpenAIError>;

#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing API key or invalid settings
    #[error("OpenAI configuration error: {0}")]
    Config(String),

    /// Request never got an HTTP response
    #[error("OpenAI network error: {0}")]
    Network(String),

    /// Non-2xx response, or a response without a usable choice
    #[error("{0}")]
    Api(String),

    /// Response body did not match the expected shape
    #[error("OpenAI parse error: {0}")]
    Parse(String),
}
