//! Redditscout - LLM agents that scout subreddits for places to advertise
//!
//! Each configured subreddit gets a search agent that repeatedly searches,
//! loads and critiques posts, then asks a selector for the best ones. The
//! crawler runs one agent per subreddit and collects their picks.

pub mod agents;
pub mod config;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod llm;
pub mod scraper;

pub use crawler::Crawler;
pub use error::{CrawlerError, Result};
