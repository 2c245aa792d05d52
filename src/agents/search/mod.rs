//! Search loop - iterative search, load and critique for one scraper.

pub mod agent;
pub mod state;

pub use agent::{SearchAgent, SearchPrompts};
pub use state::{
    IterationBounds, LoopState, MAX_ITERATIONS, RECURSION_LIMIT, SearchNode, StateUpdate,
    worst_case_steps,
};
