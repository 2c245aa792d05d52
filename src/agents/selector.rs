//! Selector - picks the posts worth advertising in from a run's critiques.

use std::sync::Arc;

use log::debug;

use crate::domain::{PostChoice, PostChoiceList, PostCritique};
use crate::error::Result;
use crate::llm::{LlmClient, Message, invoke_structured};

pub struct Selector {
    llm: Arc<dyn LlmClient>,
    description_prompt: String,
    introduction_prompt: String,
}

impl Selector {
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

    fn script(&self, critiques: &[PostCritique]) -> Result<Vec<Message>> {
        Ok(vec![
            Message::system(&self.description_prompt),
            Message::system(&self.introduction_prompt),
            Message::user(serde_json::to_string(critiques)?),
        ])
    }

    /// Choose from the accumulated critiques with a single model call.
    ///
    /// An empty list means nothing was suitable.
    pub async fn run(&self, critiques: &[PostCritique]) -> Result<Vec<PostChoice>> {
        let choices: PostChoiceList =
            invoke_structured(self.llm.as_ref(), self.script(critiques)?).await?;
        debug!("Selected {} of {} critiqued posts", choices.posts.len(), critiques.len());
        Ok(choices.posts)
    }
}
