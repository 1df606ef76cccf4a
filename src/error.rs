//! Error types for foundry-agents

use thiserror::Error;

/// Result type alias for foundry-agents operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving remote agents
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success answer from the agent platform
    #[error("Agent service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Email error: {0}")]
    Email(String),

    #[error("SMS error: {message}")]
    Sms { message: String, code: Option<i64> },

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
