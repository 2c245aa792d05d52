//! SearchAgent - drives the search loop for one scraper.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;

use super::state::{IterationBounds, LoopState, RECURSION_LIMIT, SearchNode, StateUpdate};
use crate::agents::aggregate::unique_by_link;
use crate::agents::{Critic, Selector};
use crate::config::PromptsConfig;
use crate::domain::{LoopChoice, LoopDecision, Post, PostChoice, PostsToLoad};
use crate::error::{CrawlerError, Result};
use crate::llm::{CompletionRequest, LlmClient, Message, ToolChoice, invoke_structured};
use crate::scraper::{SEARCH_TOOL, Scraper, load_as_text, search_as_text, search_tool};

/// Prompts the search loop feeds the model
#[derive(Debug, Clone)]
pub struct SearchPrompts {
    pub description: String,
    pub search: String,
    pub select: String,
    pub decide_loop: String,
}

impl From<&PromptsConfig> for SearchPrompts {
    fn from(prompts: &PromptsConfig) -> Self {
        Self {
            description: prompts.description.clone(),
            search: prompts.search.clone(),
            select: prompts.select.clone(),
            decide_loop: prompts.decide_loop.clone(),
        }
    }
}

pub struct SearchAgent {
    scraper: Arc<dyn Scraper>,
    llm: Arc<dyn LlmClient>,
    critic: Arc<Critic>,
    selector: Arc<Selector>,
    prompts: SearchPrompts,
    tags: Arc<Vec<String>>,
    bounds: IterationBounds,
}

impl SearchAgent {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        llm: Arc<dyn LlmClient>,
        critic: Arc<Critic>,
        selector: Arc<Selector>,
        prompts: SearchPrompts,
        tags: Arc<Vec<String>>,
        bounds: IterationBounds,
    ) -> Self {
        Self {
            scraper,
            llm,
            critic,
            selector,
            prompts,
            tags,
            bounds,
        }
    }

    pub fn scraper(&self) -> &dyn Scraper {
        self.scraper.as_ref()
    }

    /// Run the loop `tries` times concurrently and merge the selections.
    ///
    /// Runs that fail are dropped; the result is deduplicated by link with
    /// the earliest run's choice winning.
    pub async fn run(&self, tries: usize) -> Vec<PostChoice> {
        info!(
            "Scraping {}. Running the Agent with {} to {} iterations.",
            self.scraper,
            self.bounds.min(),
            self.bounds.max()
        );

        let results = join_all((0..tries).map(|run_id| self.run_once(run_id))).await;

        let selections: Vec<Vec<PostChoice>> = results
            .into_iter()
            .enumerate()
            .filter_map(|(run_id, result)| match result {
                Ok(selection) => Some(selection),
                Err(e) => {
                    warn!(
                        "run ID: {}. Scraping {}. Run failed, dropping its results: {}",
                        run_id, self.scraper, e
                    );
                    None
                }
            })
            .collect();

        info!("Scraping {}. Aggregating results from {} runs.", self.scraper, tries);

        unique_by_link(selections.into_iter().flatten())
    }

    /// Execute one run from `Description` to `End`.
    pub async fn run_once(&self, run_id: usize) -> Result<Vec<PostChoice>> {
        let mut state = LoopState::new(run_id);
        let mut node = SearchNode::Description;
        let mut steps = 0;

        while node != SearchNode::End {
            steps += 1;
            if steps > RECURSION_LIMIT {
                return Err(CrawlerError::InvalidState(format!(
                    "run {} exceeded {} steps",
                    run_id, RECURSION_LIMIT
                )));
            }

            let update = self.step(node, &state).await?;
            state.apply(update)?;

            let decision = match node {
                SearchNode::Critique => Some(self.decide_loop(&state).await?),
                _ => None,
            };
            let next = node.next(decision)?;
            debug!("run ID: {}. {} -> {}", run_id, node, next);
            node = next;
        }

        state.selection.ok_or_else(|| {
            CrawlerError::InvalidState(format!("run {} ended without a selection", run_id))
        })
    }

    async fn step(&self, node: SearchNode, state: &LoopState) -> Result<StateUpdate> {
        match node {
            SearchNode::Description => {
                self.log_step(state, "Introducing the product.");
                Ok(self.description())
            }
            SearchNode::Search => self.search(state).await,
            SearchNode::SearchTools => Ok(self.search_tools(state).await),
            SearchNode::SelectPost => self.select_post(state).await,
            SearchNode::Load => Ok(self.load(state).await),
            SearchNode::Critique => self.critique(state).await,
            SearchNode::Summary => self.summarize(state).await,
            SearchNode::End => Err(CrawlerError::InvalidState("End has no handler".to_string())),
        }
    }

    fn log_step(&self, state: &LoopState, step: &str) {
        info!("run ID: {}. Scraping {}. {}", state.run_id, self.scraper, step);
    }

    fn description(&self) -> StateUpdate {
        StateUpdate {
            messages: vec![Message::system(&self.prompts.description)],
            ..Default::default()
        }
    }

    fn search_prompt(&self) -> String {
        format!("{} Tags that might come in handy: {:?}", self.prompts.search, self.tags)
    }

    async fn search(&self, state: &LoopState) -> Result<StateUpdate> {
        self.log_step(state, "Searching for posts.");

        let prompt = Message::user(self.search_prompt());
        let request = CompletionRequest::new(state.messages.clone())
            .with_message(prompt.clone())
            .with_tools(vec![search_tool(self.scraper.as_ref())])
            .with_tool_choice(ToolChoice::Auto);

        let response = self.llm.complete(request).await?;

        let queries: Vec<String> = response
            .tool_calls
            .iter()
            .filter(|call| call.name == SEARCH_TOOL)
            .filter_map(|call| call.input.get("query").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let mut reply: Vec<String> = Vec::new();
        if !response.content.trim().is_empty() {
            reply.push(response.content.clone());
        }
        reply.extend(queries.iter().map(|q| format!("Searching for: {}", q)));
        if reply.is_empty() {
            reply.push("No search issued.".to_string());
        }

        Ok(StateUpdate {
            messages: vec![prompt, Message::assistant(reply.join("\n"))],
            iteration: Some(state.iteration + 1),
            pending_searches: Some(queries),
            ..Default::default()
        })
    }

    async fn search_tools(&self, state: &LoopState) -> StateUpdate {
        self.log_step(state, &format!("Running {} searches.", state.pending_searches.len()));

        let mut messages = Vec::with_capacity(state.pending_searches.len());
        for query in &state.pending_searches {
            let results = search_as_text(self.scraper.as_ref(), query).await;
            messages.push(Message::user(format!("Search results for \"{}\":\n{}", query, results)));
        }

        StateUpdate {
            messages,
            pending_searches: Some(Vec::new()),
            ..Default::default()
        }
    }

    async fn select_post(&self, state: &LoopState) -> Result<StateUpdate> {
        self.log_step(state, "Selecting pages to visit.");

        let prompt = Message::user(&self.prompts.select);
        let mut messages = state.messages.clone();
        messages.push(prompt.clone());

        let choice: PostsToLoad = invoke_structured(self.llm.as_ref(), messages).await?;

        Ok(StateUpdate {
            messages: vec![prompt, Message::assistant(serde_json::to_string(&choice)?)],
            posts_to_load: Some(choice.posts),
            ..Default::default()
        })
    }

    async fn load(&self, state: &LoopState) -> StateUpdate {
        self.log_step(state, "Loading posts.");

        let mut loaded = state.loaded_posts.clone();
        for header in &state.posts_to_load {
            let content = load_as_text(self.scraper.as_ref(), &header.link).await;
            loaded.push(Post::new(header.clone(), content));
        }

        StateUpdate {
            posts_to_load: Some(Vec::new()),
            loaded_posts: Some(loaded),
            ..Default::default()
        }
    }

    async fn critique(&self, state: &LoopState) -> Result<StateUpdate> {
        self.log_step(state, "Critiquing post candidates.");

        let critiques = self.critic.run(&state.loaded_posts).await;

        Ok(StateUpdate {
            messages: vec![Message::assistant(serde_json::to_string(&critiques)?)],
            loaded_posts: Some(Vec::new()),
            critiques,
            ..Default::default()
        })
    }

    async fn summarize(&self, state: &LoopState) -> Result<StateUpdate> {
        self.log_step(state, "Picking the best posts.");

        let selection = self.selector.run(&state.post_critiques).await?;

        self.log_step(state, "Run ending.");

        Ok(StateUpdate {
            selection: Some(selection),
            ..Default::default()
        })
    }

    /// Bounds first, then the model.
    async fn decide_loop(&self, state: &LoopState) -> Result<LoopChoice> {
        if let Some(forced) = self.bounds.forced(state.iteration) {
            return Ok(forced);
        }

        let mut messages = state.messages.clone();
        messages.push(Message::user(&self.prompts.decide_loop));

        let decision: LoopDecision = invoke_structured(self.llm.as_ref(), messages).await?;
        debug!(
            "run ID: {}. Scraping {}. Model chose {:?} after {} iterations",
            state.run_id, self.scraper, decision.loop_decision, state.iteration
        );
        Ok(decision.loop_decision)
    }
}
