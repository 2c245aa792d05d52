//! Search loop state machine: nodes, state, updates and transitions.

use std::fmt;

use crate::domain::{LoopChoice, Post, PostChoice, PostCritique, PostHeader};
use crate::error::{CrawlerError, Result};
use crate::llm::Message;

/// Node executions allowed in one run before it is aborted
pub const RECURSION_LIMIT: usize = 200;

/// Nodes executed by one pass from `Search` through `Critique`
const STEPS_PER_ITERATION: usize = 5;

/// Largest `max_iterations` whose worst-case run fits in `RECURSION_LIMIT`
pub const MAX_ITERATIONS: u32 = ((RECURSION_LIMIT - 2) / STEPS_PER_ITERATION) as u32;

/// Node executions of a run that makes `iterations` passes, counting
/// `Description` and `Summary`.
pub const fn worst_case_steps(iterations: u32) -> usize {
    2 + STEPS_PER_ITERATION * iterations as usize
}

/// Steps of a single search loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchNode {
    /// Seed the conversation with the product description
    Description,
    /// Ask the model to formulate search queries
    Search,
    /// Execute the queries against the scraper
    SearchTools,
    /// Ask the model which results to load
    SelectPost,
    /// Fetch the chosen posts
    Load,
    /// Critique the loaded posts
    Critique,
    /// Select the final posts
    Summary,
    /// Terminal
    End,
}

impl SearchNode {
    /// Successor along an unconditional edge, `None` where the next node
    /// depends on a loop decision or the run has ended.
    pub fn fixed_successor(self) -> Option<SearchNode> {
        match self {
            SearchNode::Description => Some(SearchNode::Search),
            SearchNode::Search => Some(SearchNode::SearchTools),
            SearchNode::SearchTools => Some(SearchNode::SelectPost),
            SearchNode::SelectPost => Some(SearchNode::Load),
            SearchNode::Load => Some(SearchNode::Critique),
            SearchNode::Critique => None,
            SearchNode::Summary => Some(SearchNode::End),
            SearchNode::End => None,
        }
    }

    /// Next node to run. `decision` is only consulted after `Critique`.
    pub fn next(self, decision: Option<LoopChoice>) -> Result<SearchNode> {
        match (self, decision) {
            (SearchNode::Critique, Some(LoopChoice::Search)) => Ok(SearchNode::Search),
            (SearchNode::Critique, Some(LoopChoice::Summary)) => Ok(SearchNode::Summary),
            (SearchNode::Critique, None) => Err(CrawlerError::InvalidState(
                "Critique requires a loop decision".to_string(),
            )),
            (node, _) => node.fixed_successor().ok_or_else(|| {
                CrawlerError::InvalidState(format!("No transition out of {}", node))
            }),
        }
    }
}

impl fmt::Display for SearchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchNode::Description => "description",
            SearchNode::Search => "search",
            SearchNode::SearchTools => "search_tools",
            SearchNode::SelectPost => "select_post",
            SearchNode::Load => "load",
            SearchNode::Critique => "critique",
            SearchNode::Summary => "summary",
            SearchNode::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// Floor and ceiling on search iterations per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationBounds {
    min: u32,
    max: u32,
}

impl IterationBounds {
    /// Reject bounds that are inverted or that a run could not finish
    /// within the step limit.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if max == 0 {
            return Err(CrawlerError::Config("max_iterations must be at least 1".to_string()));
        }
        if max > MAX_ITERATIONS {
            return Err(CrawlerError::Config(format!(
                "max_iterations ({}) must not exceed {}",
                max, MAX_ITERATIONS
            )));
        }
        if min > max {
            return Err(CrawlerError::Config(format!(
                "min_iterations ({}) must not exceed max_iterations ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Decision imposed by the bounds after `iteration` passes, if any.
    /// The ceiling wins over the floor; `None` leaves it to the model.
    pub fn forced(&self, iteration: u32) -> Option<LoopChoice> {
        if iteration >= self.max {
            Some(LoopChoice::Summary)
        } else if iteration < self.min {
            Some(LoopChoice::Search)
        } else {
            None
        }
    }
}

/// Everything one run knows about itself.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    pub run_id: usize,
    /// Completed `Search` steps
    pub iteration: u32,
    /// Conversation shared by the model-facing steps
    pub messages: Vec<Message>,
    /// Queries the model asked for in the latest `Search` step
    pub pending_searches: Vec<String>,
    pub posts_to_load: Vec<PostHeader>,
    /// Loaded but not yet critiqued
    pub loaded_posts: Vec<Post>,
    /// Append-only over the whole run
    pub post_critiques: Vec<PostCritique>,
    /// Set once, by `Summary`
    pub selection: Option<Vec<PostChoice>>,
}

/// Changes produced by one node handler.
///
/// `messages` and `critiques` are appended; every `Some` field replaces the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub iteration: Option<u32>,
    pub pending_searches: Option<Vec<String>>,
    pub posts_to_load: Option<Vec<PostHeader>>,
    pub loaded_posts: Option<Vec<Post>>,
    pub critiques: Vec<PostCritique>,
    pub selection: Option<Vec<PostChoice>>,
}

impl LoopState {
    pub fn new(run_id: usize) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }

    /// Fold an update into the state.
    pub fn apply(&mut self, update: StateUpdate) -> Result<()> {
        if let Some(iteration) = update.iteration {
            if iteration != self.iteration + 1 {
                return Err(CrawlerError::InvalidState(format!(
                    "Iteration must advance by one (at {}, got {})",
                    self.iteration, iteration
                )));
            }
            self.iteration = iteration;
        }

        if update.selection.is_some() && self.selection.is_some() {
            return Err(CrawlerError::InvalidState("Selection already made".to_string()));
        }

        self.messages.extend(update.messages);
        self.post_critiques.extend(update.critiques);

        if let Some(searches) = update.pending_searches {
            self.pending_searches = searches;
        }
        if let Some(posts) = update.posts_to_load {
            self.posts_to_load = posts;
        }
        if let Some(posts) = update.loaded_posts {
            self.loaded_posts = posts;
        }
        if update.selection.is_some() {
            self.selection = update.selection;
        }

        Ok(())
    }
}
