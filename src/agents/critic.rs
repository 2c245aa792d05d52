//! Critic - judges each loaded post as an advertising venue.
//!
//! Every post gets its own three-message script: product description,
//! critic role, then the post itself. Posts are critiqued concurrently and
//! independently; a post whose critique fails is left out of the result.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};

use crate::domain::{Critique, Post, PostCritique};
use crate::error::Result;
use crate::llm::{LlmClient, Message, invoke_structured};

pub struct Critic {
    llm: Arc<dyn LlmClient>,
    description_prompt: String,
    introduction_prompt: String,
}

impl Critic {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        description_prompt: impl Into<String>,
        introduction_prompt: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            description_prompt: description_prompt.into(),
            introduction_prompt: introduction_prompt.into(),
        }
    }

    fn script(&self, post: &Post) -> Vec<Message> {
        vec![
            Message::system(&self.description_prompt),
            Message::system(&self.introduction_prompt),
            Message::user(&post.content),
        ]
    }

    async fn critique(&self, post: &Post) -> Result<Critique> {
        invoke_structured(self.llm.as_ref(), self.script(post)).await
    }

    /// Critique every post; output order follows input order.
    pub async fn run(&self, posts: &[Post]) -> Vec<PostCritique> {
        let results = join_all(posts.iter().map(|post| self.critique(post))).await;

        let critiques: Vec<PostCritique> = posts
            .iter()
            .zip(results)
            .filter_map(|(post, result)| match result {
                Ok(critique) => Some(PostCritique {
                    post: post.header.clone(),
                    critique,
                }),
                Err(e) => {
                    warn!("Critique of {} failed, skipping: {}", post.header.link, e);
                    None
                }
            })
            .collect();

        debug!("Critiqued {}/{} posts", critiques.len(), posts.len());
        critiques
    }
}
