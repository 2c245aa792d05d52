//! Error types for redditscout
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while crawling
#[derive(Debug, Error)]
pub enum CrawlerError {
    /// Invalid configuration, fatal at construction time
    #[error("Config error: {0}")]
    Config(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The model did not produce a value of the requested shape
    #[error("Structured output error: {0}")]
    StructuredOutput(String),

    /// Scraper/API error
    #[error("Scraper error: {0}")]
    Scraper(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;
