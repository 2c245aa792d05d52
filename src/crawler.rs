//! Crawler - one search agent per scraper, run in parallel.

use std::sync::Arc;

use log::info;

use crate::agents::{Critic, IterationBounds, SearchAgent, SearchPrompts, Selector};
use crate::config::Config;
use crate::domain::PostChoice;
use crate::error::{CrawlerError, Result};
use crate::llm::LlmClient;
use crate::scraper::Scraper;

pub struct Crawler {
    agents: Vec<Arc<SearchAgent>>,
    tries: usize,
}

impl Crawler {
    /// Build the agents. The Critic and Selector are shared by every scraper.
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        scrapers: Vec<Arc<dyn Scraper>>,
    ) -> Result<Self> {
        if config.agent.tries == 0 {
            return Err(CrawlerError::Config("tries must be at least 1".to_string()));
        }
        let bounds =
            IterationBounds::new(config.agent.min_iterations, config.agent.max_iterations)?;

        let prompts = &config.prompts;
        let critic = Arc::new(Critic::new(
            llm.clone(),
            &prompts.description,
            &prompts.critic_introduction,
        ));
        let selector = Arc::new(Selector::new(
            llm.clone(),
            &prompts.description,
            &prompts.selector_introduction,
        ));
        let search_prompts = SearchPrompts::from(prompts);
        let tags = Arc::new(config.tags.clone());

        let agents = scrapers
            .into_iter()
            .map(|scraper| {
                Arc::new(SearchAgent::new(
                    scraper,
                    llm.clone(),
                    critic.clone(),
                    selector.clone(),
                    search_prompts.clone(),
                    tags.clone(),
                    bounds,
                ))
            })
            .collect();

        Ok(Self {
            agents,
            tries: config.agent.tries,
        })
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Run every agent to completion and concatenate their results in
    /// scraper order. A scraper task that panics contributes nothing.
    pub async fn run(&self) -> Vec<PostChoice> {
        let handles: Vec<_> = self
            .agents
            .iter()
            .map(|agent| {
                let agent = agent.clone();
                let tries = self.tries;
                tokio::spawn(async move { agent.run(tries).await })
            })
            .collect();

        let mut results = Vec::new();
        for (agent, handle) in self.agents.iter().zip(handles) {
            match handle.await {
                Ok(choices) => results.extend(choices),
                Err(e) => {
                    tracing::error!(
                        scraper = %agent.scraper(),
                        error = ?e,
                        "Scraper task panicked"
                    );
                }
            }
        }

        info!("All agents have completed their runs, found {} posts.", results.len());
        results
    }
}
