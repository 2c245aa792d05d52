//! Domain types for redditscout
//!
//! This module contains the records the agents exchange:
//! - PostHeader / Post: identity and loaded content of a post
//! - Critique / PostCritique: per-post suitability assessment
//! - PostChoice / PostChoiceList: the selector's final picks
//! - PostsToLoad / LoopDecision: structured decisions inside the search loop

pub mod decision;
pub mod post;

pub use decision::{LoopChoice, LoopDecision, PostsToLoad};
pub use post::{Critique, Post, PostChoice, PostChoiceList, PostCritique, PostHeader};
