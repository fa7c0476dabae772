//! Ecopulse Source Fetchers
//!
//! Pulls raw signals from the issue tracker, forum feeds, and social
//! communities, and normalizes them into the overview snapshots the
//! scorer consumes. Each fetcher tolerates per-unit failure and reports
//! source-level failure only when nothing at all could be fetched.

pub mod classify;
pub mod forum;
pub mod http;
pub mod issues;
pub mod sentiment;
pub mod social;
pub mod stats;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, FetcherError>;

/// A tracked issue-tracker repository.
#[derive(Debug, Clone)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct IssueTrackerConfig {
    pub api_base: String,
    pub repos: Vec<RepoRef>,
    pub lookback_days: i64,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    /// Optional bearer token for higher rate limits.
    pub token: Option<String>,
}

impl Default for IssueTrackerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            repos: vec![
                RepoRef::new("canonical", "snapd"),
                RepoRef::new("canonical", "multipass"),
                RepoRef::new("canonical", "cloud-init"),
                RepoRef::new("ubuntu", "ubuntu-make"),
                RepoRef::new("ubuntu", "gnome-shell-extension-appindicator"),
            ],
            lookback_days: 30,
            request_delay_ms: 100,
            max_retries: 3,
            token: std::env::var("GITHUB_TOKEN").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForumConfig {
    pub feeds: Vec<FeedRef>,
    pub lookback_days: i64,
    pub max_retries: u32,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                FeedRef {
                    name: "Ubuntu Discourse Latest".to_string(),
                    url: "https://discourse.ubuntu.com/latest.rss".to_string(),
                },
                FeedRef {
                    name: "Ubuntu Discourse Top".to_string(),
                    url: "https://discourse.ubuntu.com/top.rss".to_string(),
                },
            ],
            lookback_days: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SocialConfig {
    pub host: String,
    pub communities: Vec<String>,
    pub lookback_days: i64,
    pub max_pages: u32,
    pub request_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            host: "https://www.reddit.com".to_string(),
            communities: vec![
                "Ubuntu".to_string(),
                "linux".to_string(),
                "linuxquestions".to_string(),
            ],
            lookback_days: 30,
            max_pages: 2,
            // Be conservative with the social endpoint's rate limits.
            request_delay_ms: 2000,
            max_retries: 2,
        }
    }
}

/// Configuration for all three source fetchers.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub issues: IssueTrackerConfig,
    pub forum: ForumConfig,
    pub social: SocialConfig,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            issues: IssueTrackerConfig::default(),
            forum: ForumConfig::default(),
            social: SocialConfig::default(),
            user_agent: "Ecopulse/0.1 (ecosystem health dashboard)".to_string(),
        }
    }
}
