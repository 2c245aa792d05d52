//! Agents - the model-driven components of a crawl
//!
//! - Critic: judges each loaded post
//! - Selector: picks the final posts of a run
//! - SearchAgent: runs the search loop for one scraper and merges its tries

pub mod aggregate;
pub mod critic;
pub mod search;
pub mod selector;

pub use aggregate::unique_by_link;
pub use critic::Critic;
pub use search::{IterationBounds, MAX_ITERATIONS, SearchAgent, SearchNode, SearchPrompts};
pub use selector::Selector;
