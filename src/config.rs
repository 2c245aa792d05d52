use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::agents::IterationBounds;
use crate::error::CrawlerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub reddit: RedditConfig,
    pub tags: Vec<String>,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            timeout_ms: 300000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Independent search loop runs per scraper
    pub tries: usize,
    pub min_iterations: u32,
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            min_iterations: 3,
            max_iterations: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub subreddits: Vec<String>,
    pub timescope_hours: i64,
    pub post_limit: u32,
    pub max_comments: usize,
    pub time_filter: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddits: vec![
                "LocalLLaMA".to_string(),
                "MachineLearning".to_string(),
                "LocalLLM".to_string(),
            ],
            timescope_hours: 24,
            post_limit: 20,
            max_comments: 5,
            time_filter: "month".to_string(),
            user_agent: "marketing agent".to_string(),
            timeout_ms: 30000,
        }
    }
}

fn default_tags() -> Vec<String> {
    [
        "executorch",
        "on-device ai",
        "local ai",
        "local LLMs",
        "private LLMs",
        "mobile LLMs",
        "react native LLM",
        "react native AI",
        "AI on mobile",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

const DESCRIPTION_PROMPT: &str = r#"THE LIBRARY IS STRICTLY FOR MOBILE DEVICES, not just any local AI

React Native ExecuTorch is a declarative way to run AI models in React Native on device, powered by ExecuTorch.

ExecuTorch is a novel framework created by Meta that enables running AI models on devices such as mobile phones or microcontrollers. React Native ExecuTorch bridges the gap between React Native and native platform capabilities, allowing developers to run AI models locally on mobile devices with state-of-the-art performance, without requiring deep knowledge of native code or machine learning internals.

What is React Native ExecuTorch?
React Native ExecuTorch brings Meta's ExecuTorch AI framework into the React Native ecosystem, enabling developers to run AI models and LLMs locally, directly on mobile devices. It provides a declarative API for on-device inference, allowing you to use local AI models without relying on cloud infrastructure. Built on the ExecuTorch foundation - part of the PyTorch Edge ecosystem - it extends efficient on-device AI deployment to cross-platform mobile applications in React Native.

Why React Native ExecuTorch?
privacy first
React Native ExecuTorch allows on-device execution of AI models, eliminating the need for external API calls. This means your app's data stays on the device, ensuring maximum privacy for your users.

cost effective
The on-device computing nature of React Native ExecuTorch means you don't have to worry about cloud infrastructure. This approach reduces server costs and minimizes latency.

model variety
We support a wide variety of models, including LLMs, such as Qwen 3, Llama 3.2, SmolLM 2, and Hammer 2.1, as well as CLIP for image embedding, Whisper for ASR, and a selection of computer vision models.

developer friendly
There's no need for deep AI expertise, we handle the complexities of AI models on the native side, making it simple for developers to use these models in React Native.

Want to see our React Native LLMs in action?
Download Private Mind - our on-device AI chatbot that works entirely offline.

With Private Mind you can:
Chat freely with no restrictions.
Keep your data safe and private.
Browse, test, and benchmark local language models.
Customize AI assistants to match your workflow and style.

React Native Executorch does NOT support local AI agents - it only allows you to run foundational models locally with the arguments they take as input.

React Native Executorch supports: Natural Language Processing (LLMs, Speech to Text, Text Embeddings, Tokenizer), Computer Vision (Classification, Image Embeddings, Image Segmentation, OCR, Object Detection, Style Transfer, Vertical OCR).
"#;

const SEARCH_PROMPT: &str = "\
    Search, using the available tool, for posts where we could advertise our products - \
    that is, where users may need our tool, not just on similar topics.";

const SELECT_PROMPT: &str = "\
    From posts found above - if there are any - pick posts to load that are likely to be \
    good places to advertise our product - that is, where users may need our tool, not \
    just on similar topics. Remember, we are ONLY interested in mobile/edge.";

const DECIDE_LOOP_PROMPT: &str = "\
    If you haven't found suitable posts in any previous answer, continue searching (modify \
    query or increase amount of loaded posts, you can also create queries based on the \
    product description). If you can still find some new ones, keep searching. If you \
    can't find any more suitable posts, summarize.";

const CRITIC_INTRODUCTION_PROMPT: &str = "\
    You are a critic designed to judge the suitability of a provided post for advertising \
    our product. Post talking about similar topics is not enough, the post should be a \
    place where our tool may help someone. Answer concisely, but don't omit any key points \
    or downsides. Remember, we are ONLY interested in mobile/edge, posts not about mobile \
    are ABSOLUTELY NOT suitable.";

const SELECTOR_INTRODUCTION_PROMPT: &str = "\
    You are a selector designed to pick from a list of posts and their critiques. You're \
    supposed to pick these ones, which are suitable to advertise our product - there's no \
    guarantee that any post is. Post talking about similar topics is not enough, the post \
    should be a place where our tool may help someone. Base your judgment on the provided \
    critiques.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Product description shared by every agent
    pub description: String,
    pub search: String,
    pub select: String,
    pub decide_loop: String,
    pub critic_introduction: String,
    pub selector_introduction: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            description: DESCRIPTION_PROMPT.to_string(),
            search: SEARCH_PROMPT.to_string(),
            select: SELECT_PROMPT.to_string(),
            decide_loop: DECIDE_LOOP_PROMPT.to_string(),
            critic_introduction: CRITIC_INTRODUCTION_PROMPT.to_string(),
            selector_introduction: SELECTOR_INTRODUCTION_PROMPT.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            agent: AgentConfig::default(),
            reddit: RedditConfig::default(),
            tags: default_tags(),
            prompts: PromptsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config =
                config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!(
                            "Failed to load config from {}: {}",
                            primary_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the loop bounds and run counts before a crawl starts
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.agent.tries == 0 {
            return Err(CrawlerError::Config("tries must be at least 1".to_string()));
        }
        IterationBounds::new(self.agent.min_iterations, self.agent.max_iterations)?;
        if self.reddit.subreddits.is_empty() {
            return Err(CrawlerError::Config("no subreddits configured".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_campaign() {
        let config = Config::default();
        assert_eq!(config.agent.tries, 3);
        assert_eq!(config.agent.min_iterations, 3);
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.reddit.subreddits.len(), 3);
        assert!(config.tags.contains(&"executorch".to_string()));
        assert!(config.prompts.description.contains("React Native ExecuTorch"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "agent:\n  tries: 1\n  max_iterations: 2\n\
             reddit:\n  subreddits: [reactnative]\ntags: [executorch]"
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();

        assert_eq!(config.agent.tries, 1);
        assert_eq!(config.agent.max_iterations, 2);
        assert_eq!(config.agent.min_iterations, 3);
        assert_eq!(config.reddit.subreddits, vec!["reactnative".to_string()]);
        assert_eq!(config.reddit.post_limit, 20);
        assert_eq!(config.tags, vec!["executorch".to_string()]);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let path = PathBuf::from("/nonexistent/redditscout.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.agent.min_iterations = 6;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CrawlerError::Config(_)));
        assert!(err.to_string().contains("min_iterations (6)"));
    }

    #[test]
    fn test_validate_rejects_ceiling_past_step_limit() {
        let mut config = Config::default();
        config.agent.min_iterations = 45;
        config.agent.max_iterations = 45;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CrawlerError::Config(_)));
        assert!(err.to_string().contains("max_iterations (45)"));

        config.agent.min_iterations = 39;
        config.agent.max_iterations = 39;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_tries_and_iterations() {
        let mut config = Config::default();
        config.agent.tries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.agent.min_iterations = 0;
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }
}
