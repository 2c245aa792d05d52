//! Subreddit scraper over the Reddit OAuth API.
//!
//! Uses application-only OAuth (client credentials). Search is restricted
//! to one subreddit and to posts newer than the configured timescope.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Scraper;
use crate::domain::PostHeader;
use crate::error::{CrawlerError, Result};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com";
const REDDIT_API_URL: &str = "https://oauth.reddit.com";
const REDDIT_WEB_URL: &str = "https://www.reddit.com";

/// Tokens are refreshed this long before they expire
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// App credentials for the Reddit API
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl RedditCredentials {
    /// Read REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET from the environment
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("REDDIT_CLIENT_ID")
            .map_err(|_| CrawlerError::Config("REDDIT_CLIENT_ID not set".to_string()))?;
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET")
            .map_err(|_| CrawlerError::Config("REDDIT_CLIENT_SECRET not set".to_string()))?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

/// Settings for one subreddit scraper
#[derive(Debug, Clone)]
pub struct RedditScraperConfig {
    pub subreddit: String,
    /// Maximum number of posts per search
    pub post_limit: u32,
    /// How many top comments to include when loading a post
    pub max_comments: usize,
    /// How old the posts we wish to see may be
    pub timescope: TimeDelta,
    /// Reddit search time filter (hour, day, week, month, year, all)
    pub time_filter: String,
    pub user_agent: String,
    pub auth_url: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl RedditScraperConfig {
    pub fn new(subreddit: impl Into<String>) -> Self {
        Self {
            subreddit: subreddit.into(),
            post_limit: 20,
            max_comments: 5,
            timescope: TimeDelta::days(1),
            time_filter: "month".to_string(),
            user_agent: "marketing agent".to_string(),
            auth_url: REDDIT_AUTH_URL.to_string(),
            api_url: REDDIT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct Submission {
    title: String,
    permalink: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    selftext: String,
}

#[derive(Debug, Deserialize)]
struct Comment {
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    score: i64,
}

/// Scraper for a specified subreddit
pub struct RedditScraper {
    client: Client,
    credentials: RedditCredentials,
    config: RedditScraperConfig,
    token: tokio::sync::Mutex<Option<AccessToken>>,
    search_cache: Mutex<HashMap<String, Vec<PostHeader>>>,
}

impl RedditScraper {
    pub fn new(config: RedditScraperConfig, credentials: RedditCredentials) -> Result<Self> {
        info!("Initializing Reddit client for r/{}", config.subreddit);

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CrawlerError::Scraper(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            config,
            token: tokio::sync::Mutex::new(None),
            search_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn subreddit(&self) -> &str {
        &self.config.subreddit
    }

    /// Oldest creation time (unix seconds) a post may have to be reported
    fn cutoff(&self) -> f64 {
        (Utc::now() - self.config.timescope).timestamp() as f64
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.config.auth_url.trim_end_matches('/'));
        debug!("Requesting Reddit access token from {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CrawlerError::Scraper(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CrawlerError::Scraper(format!(
                "Token request rejected: {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CrawlerError::Scraper(format!("Invalid token response: {}", e)))?;

        let lifetime = (body.expires_in - TOKEN_REFRESH_MARGIN_SECS).max(0);
        let token = AccessToken {
            value: body.access_token,
            expires_at: Utc::now() + TimeDelta::seconds(lifetime),
        };
        let value = token.value.clone();
        *guard = Some(token);

        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| CrawlerError::Scraper(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::Scraper(format!("Request to {} returned {}", path, status)));
        }

        response
            .json()
            .await
            .map_err(|e| CrawlerError::Scraper(format!("Invalid response from {}: {}", path, e)))
    }

    fn cached(&self, query: &str) -> Option<Vec<PostHeader>> {
        self.search_cache.lock().ok().and_then(|cache| cache.get(query).cloned())
    }

    fn remember(&self, query: &str, posts: &[PostHeader]) {
        if let Ok(mut cache) = self.search_cache.lock() {
            cache.insert(query.to_string(), posts.to_vec());
        }
    }
}

/// Path component of a post link, e.g. `/r/sub/comments/abc/title/`
fn post_path(link: &str) -> Result<String> {
    if link.starts_with('/') {
        return Ok(link.to_string());
    }
    let url = Url::parse(link)
        .map_err(|e| CrawlerError::Scraper(format!("Invalid post link {}: {}", link, e)))?;
    Ok(url.path().to_string())
}

fn render_post(submission: &Submission, comments: &[Comment], max_comments: usize) -> String {
    let mut output = vec![
        format!("Title: {}", submission.title),
        format!("Author: {}", submission.author.as_deref().unwrap_or("[deleted]")),
        format!("Score: {}", submission.score),
        format!("Link: {}{}", REDDIT_WEB_URL, submission.permalink),
    ];

    if !submission.selftext.is_empty() {
        output.push(format!("\nPost Content:\n{}", submission.selftext));
    }

    output.push(format!("\nTop {} Comments:", max_comments));

    for (i, comment) in comments.iter().take(max_comments).enumerate() {
        let body = comment.body.trim().replace('\n', " ");
        output.push(format!(
            "{}. {} (by {}, score: {})",
            i + 1,
            body,
            comment.author.as_deref().unwrap_or("[deleted]"),
            comment.score
        ));
    }

    output.join("\n\n")
}

#[async_trait]
impl Scraper for RedditScraper {
    async fn search(&self, query: &str) -> Result<Vec<PostHeader>> {
        if let Some(posts) = self.cached(query) {
            debug!("r/{}: cached search for {:?}", self.config.subreddit, query);
            return Ok(posts);
        }

        let path = format!("/r/{}/search", self.config.subreddit);
        let listing: Listing = self
            .get_json(
                &path,
                &[
                    ("q", query.to_string()),
                    ("restrict_sr", "1".to_string()),
                    ("sort", "new".to_string()),
                    ("t", self.config.time_filter.clone()),
                    ("limit", self.config.post_limit.to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;

        let cutoff = self.cutoff();
        let posts: Vec<PostHeader> = listing
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .filter_map(|thing| serde_json::from_value::<Submission>(thing.data).ok())
            .filter(|s| s.created_utc > cutoff)
            .map(|s| PostHeader::new(s.title, format!("{}{}", REDDIT_WEB_URL, s.permalink)))
            .collect();

        info!("r/{}: search {:?} found {} posts", self.config.subreddit, query, posts.len());
        self.remember(query, &posts);

        Ok(posts)
    }

    async fn load(&self, link: &str) -> Result<String> {
        let path = post_path(link)?;
        let listings: Vec<Listing> = self
            .get_json(
                &path,
                &[
                    ("limit", self.config.max_comments.to_string()),
                    ("sort", "top".to_string()),
                    ("depth", "1".to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;

        let mut listings = listings.into_iter();

        let submission = listings
            .next()
            .and_then(|l| l.data.children.into_iter().find(|t| t.kind == "t3"))
            .map(|t| serde_json::from_value::<Submission>(t.data))
            .transpose()?
            .ok_or_else(|| CrawlerError::Scraper(format!("No post found at {}", link)))?;

        let comments: Vec<Comment> = listings
            .next()
            .map(|l| {
                l.data
                    .children
                    .into_iter()
                    .filter(|t| t.kind == "t1")
                    .filter_map(|t| serde_json::from_value(t.data).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(render_post(&submission, &comments, self.config.max_comments))
    }
}

impl fmt::Display for RedditScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reddit r/{}", self.config.subreddit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> RedditCredentials {
        RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    async fn scraper_for(server: &MockServer) -> RedditScraper {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .mount(server)
            .await;

        let mut config = RedditScraperConfig::new("LocalLLaMA");
        config.auth_url = server.uri();
        config.api_url = server.uri();
        RedditScraper::new(config, credentials()).unwrap()
    }

    fn submission(title: &str, permalink: &str, created_utc: f64) -> Value {
        json!({
            "kind": "t3",
            "data": {
                "title": title,
                "permalink": permalink,
                "created_utc": created_utc,
                "author": "someone",
                "score": 12,
                "selftext": ""
            }
        })
    }

    #[test]
    fn test_display() {
        let scraper =
            RedditScraper::new(RedditScraperConfig::new("LocalLLM"), credentials()).unwrap();
        assert_eq!(scraper.to_string(), "Reddit r/LocalLLM");
    }

    #[test]
    fn test_post_path() {
        assert_eq!(
            post_path("https://www.reddit.com/r/LocalLLaMA/comments/abc/title/").unwrap(),
            "/r/LocalLLaMA/comments/abc/title/"
        );
        assert_eq!(post_path("/r/x/comments/1/").unwrap(), "/r/x/comments/1/");
        assert!(post_path("not a url").is_err());
    }

    #[test]
    fn test_render_post_limits_and_flattens_comments() {
        let submission = Submission {
            title: "Running Llama on iPhone".to_string(),
            permalink: "/r/x/comments/1/".to_string(),
            created_utc: 0.0,
            author: Some("op".to_string()),
            score: 42,
            selftext: "How do I do this?".to_string(),
        };
        let comments = vec![
            Comment {
                body: "Try\nExecuTorch".to_string(),
                author: Some("a".to_string()),
                score: 5,
            },
            Comment {
                body: "second".to_string(),
                author: None,
                score: 1,
            },
        ];

        let text = render_post(&submission, &comments, 1);

        assert!(text.starts_with("Title: Running Llama on iPhone"));
        assert!(text.contains("Link: https://www.reddit.com/r/x/comments/1/"));
        assert!(text.contains("\nPost Content:\nHow do I do this?"));
        assert!(text.contains("Top 1 Comments:"));
        assert!(text.contains("1. Try ExecuTorch (by a, score: 5)"));
        assert!(!text.contains("second"));
    }

    #[tokio::test]
    async fn test_search_filters_by_timescope() {
        let server = MockServer::start().await;
        let scraper = scraper_for(&server).await;

        let fresh = Utc::now().timestamp() as f64 - 60.0;
        let stale = Utc::now().timestamp() as f64 - 3.0 * 86400.0;

        Mock::given(method("GET"))
            .and(path("/r/LocalLLaMA/search"))
            .and(query_param("q", "executorch"))
            .and(query_param("restrict_sr", "1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": { "children": [
                    submission("fresh", "/r/LocalLLaMA/comments/1/fresh/", fresh),
                    submission("stale", "/r/LocalLLaMA/comments/2/stale/", stale)
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = scraper.search("executorch").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "fresh");
        assert_eq!(posts[0].link, "https://www.reddit.com/r/LocalLLaMA/comments/1/fresh/");

        // Served from the memo, so the mock still sees exactly one request.
        let again = scraper.search("executorch").await.unwrap();
        assert_eq!(again, posts);
    }

    #[tokio::test]
    async fn test_load_renders_post_and_comments() {
        let server = MockServer::start().await;
        let scraper = scraper_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/LocalLLaMA/comments/1/fresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "kind": "Listing", "data": { "children": [{
                    "kind": "t3",
                    "data": {
                        "title": "fresh",
                        "permalink": "/r/LocalLLaMA/comments/1/fresh/",
                        "author": "op",
                        "score": 3,
                        "selftext": "body text"
                    }
                }]}},
                { "kind": "Listing", "data": { "children": [
                    { "kind": "t1", "data": { "body": "nice", "author": "c1", "score": 2 } },
                    { "kind": "more", "data": { "children": [] } }
                ]}}
            ])))
            .mount(&server)
            .await;

        let text = scraper
            .load("https://www.reddit.com/r/LocalLLaMA/comments/1/fresh/")
            .await
            .unwrap();

        assert!(text.contains("Title: fresh"));
        assert!(text.contains("body text"));
        assert!(text.contains("1. nice (by c1, score: 2)"));
    }

    #[tokio::test]
    async fn test_http_error_is_scraper_error() {
        let server = MockServer::start().await;
        let scraper = scraper_for(&server).await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = scraper.search("anything").await;
        assert!(matches!(result, Err(CrawlerError::Scraper(_))));
    }
}
