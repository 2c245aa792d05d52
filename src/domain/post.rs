//! Post, critique and choice records passed between the agents.
//!
//! The field descriptions double as schema descriptions for the model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Post title and URL.
///
/// `link` is the identity of a post for deduplication across a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PostHeader {
    /// post title
    pub title: String,
    /// URL of the post
    pub link: String,
}

impl PostHeader {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Post header and loaded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub header: PostHeader,
    /// Rendered post text, or an inline error if loading failed
    pub content: String,
}

impl Post {
    pub fn new(header: PostHeader, content: impl Into<String>) -> Self {
        Self {
            header,
            content: content.into(),
        }
    }
}

/// Content suitability critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Critique {
    /// upsides of advertising suitability
    pub ad_upsides: String,
    /// downsides of advertising suitability
    pub ad_downsides: String,
}

/// Post suitability critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostCritique {
    /// post
    pub post: PostHeader,
    /// critique of its suitability
    pub critique: Critique,
}

/// Post and justification why it's a good pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostChoice {
    /// post
    pub post: PostHeader,
    /// why it's a good place to advertise
    pub justification: String,
}

/// List of post choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostChoiceList {
    /// list of posts
    pub posts: Vec<PostChoice>,
}
