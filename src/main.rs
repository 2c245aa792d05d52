use chrono::TimeDelta;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use redditscout::Crawler;
use redditscout::config::Config;
use redditscout::domain::PostChoice;
use redditscout::llm::{AnthropicClient, AnthropicConfig, LlmClient};
use redditscout::scraper::{RedditCredentials, RedditScraper, RedditScraperConfig, Scraper};

mod cli;

use cli::Cli;
use cli::commands::{Commands, CrawlArgs};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redditscout")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("redditscout.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_scrapers(config: &Config) -> Result<Vec<Arc<dyn Scraper>>> {
    let credentials = RedditCredentials::from_env().context("Missing Reddit credentials")?;
    let reddit = &config.reddit;

    reddit
        .subreddits
        .iter()
        .map(|subreddit| -> Result<Arc<dyn Scraper>> {
            let scraper_config = RedditScraperConfig {
                post_limit: reddit.post_limit,
                max_comments: reddit.max_comments,
                timescope: TimeDelta::hours(reddit.timescope_hours),
                time_filter: reddit.time_filter.clone(),
                user_agent: reddit.user_agent.clone(),
                timeout: Duration::from_millis(reddit.timeout_ms),
                ..RedditScraperConfig::new(subreddit)
            };
            let scraper = RedditScraper::new(scraper_config, credentials.clone())
                .context(format!("Failed to create scraper for r/{}", subreddit))?;
            Ok(Arc::new(scraper) as Arc<dyn Scraper>)
        })
        .collect()
}

fn print_choices(choices: &[PostChoice], json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(choices).context("Failed to serialize results")?;
        println!("{}", json);
        return Ok(());
    }

    if choices.is_empty() {
        println!("{}", "No suitable posts found".yellow());
        return Ok(());
    }

    for choice in choices {
        println!("{} {}", "TITLE:".green().bold(), choice.post.title);
        println!("{} {}", "LINK:".cyan().bold(), choice.post.link);
        println!("{} {}", "JUSTIFICATION:".yellow().bold(), choice.justification);
        println!();
    }
    Ok(())
}

async fn handle_crawl_command(cli: &Cli, args: &CrawlArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let llm_config = AnthropicConfig {
        model: config.llm.model.clone(),
        max_tokens: config.llm.max_tokens,
        timeout: Duration::from_millis(config.llm.timeout_ms),
        ..AnthropicConfig::default()
    };
    let anthropic =
        Arc::new(AnthropicClient::new(llm_config).context("Failed to create LLM client")?);
    if !anthropic.is_ready() {
        eyre::bail!("ANTHROPIC_API_KEY is empty");
    }
    let llm: Arc<dyn LlmClient> = anthropic.clone();
    let llm_model = llm.model().to_string();

    let scrapers = build_scrapers(&config)?;
    let crawler = Crawler::new(&config, llm, scrapers).context("Failed to create crawler")?;

    info!(
        "Crawling {} subreddits with {} tries each using {}",
        crawler.agent_count(),
        config.agent.tries,
        llm_model
    );
    if cli.is_verbose() {
        println!(
            "{} {}",
            "Crawling:".cyan(),
            config
                .reddit
                .subreddits
                .iter()
                .map(|s| format!("r/{}", s))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let choices = crawler.run().await;

    if cli.is_verbose() {
        let usage = anthropic.total_usage();
        println!(
            "{} {} tokens ({} input, {} output)",
            "Usage:".cyan(),
            usage.total(),
            usage.input_tokens,
            usage.output_tokens
        );
    }

    print_choices(&choices, args.json)
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_crawl_command(cli, &CrawlArgs::default(), config).await,
        Some(Commands::Crawl(args)) => handle_crawl_command(cli, args, config).await,
        Some(Commands::Config) => handle_config_command(&config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may come from a .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the default level is known
    setup_logging(config.log_level.as_deref().unwrap_or("info"))
        .context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
