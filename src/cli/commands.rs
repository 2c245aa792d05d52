//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - crawl: scout the configured subreddits (default)
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use redditscout::config::Config;

/// Redditscout - find Reddit posts worth advertising in
#[derive(Parser, Debug)]
#[command(name = "redditscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the subreddits and print the selected posts
    Crawl(CrawlArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for a single crawl
#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Subreddit to scout; repeat to scout several (replaces the configured list)
    #[arg(short, long = "subreddit", value_name = "NAME")]
    pub subreddits: Vec<String>,

    /// Independent runs per subreddit
    #[arg(short, long)]
    pub tries: Option<usize>,

    /// Search passes before the model may stop
    #[arg(long)]
    pub min_iterations: Option<u32>,

    /// Search passes after which the run always stops
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Print results as a JSON array
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if !self.subreddits.is_empty() {
            config.reddit.subreddits = self.subreddits.clone();
        }
        if let Some(tries) = self.tries {
            config.agent.tries = tries;
        }
        if let Some(min) = self.min_iterations {
            config.agent.min_iterations = min;
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
    }
}
