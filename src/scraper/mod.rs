//! Scrapers - per-source search and load capabilities.
//!
//! A scraper answers two questions for the search loop: which posts match a
//! query, and what a given post says. Errors from either are rendered
//! inline as text for the model instead of aborting the run.

pub mod reddit;

use std::fmt;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::PostHeader;
use crate::error::Result;
use crate::llm::ToolDefinition;

pub use reddit::{RedditCredentials, RedditScraper, RedditScraperConfig};

/// Name of the search tool offered to the model
pub const SEARCH_TOOL: &str = "search";

/// Search and load capability for one data source.
#[async_trait]
pub trait Scraper: Send + Sync + fmt::Display {
    /// Find posts matching the query
    async fn search(&self, query: &str) -> Result<Vec<PostHeader>>;

    /// Load the full text of a post
    async fn load(&self, link: &str) -> Result<String>;
}

/// Tool definition that lets the model query this scraper
pub fn search_tool(scraper: &dyn Scraper) -> ToolDefinition {
    ToolDefinition::new(
        SEARCH_TOOL,
        format!("Searches {} for posts on the topic. Returns found posts.", scraper),
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "query to search on the site"
                }
            },
            "required": ["query"]
        }),
    )
}

/// Run a search and render the outcome as tool output text
pub async fn search_as_text(scraper: &dyn Scraper, query: &str) -> String {
    match scraper.search(query).await {
        Ok(posts) if posts.is_empty() => "No results.".to_string(),
        Ok(posts) => serde_json::to_string(&posts).unwrap_or_else(|e| format!("Error: {}", e)),
        Err(e) => format!("Error: {}", e),
    }
}

/// Load a post, embedding any failure in the returned content
pub async fn load_as_text(scraper: &dyn Scraper, link: &str) -> String {
    match scraper.load(link).await {
        Ok(content) => content,
        Err(e) => format!("Error loading post: {}", e),
    }
}
