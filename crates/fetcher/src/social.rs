//! Social-post fetcher.
//!
//! Pages through recent posts per configured community, scores each with
//! the sentiment analyzer, and aggregates sentiment statistics, complaint
//! counts, and the most negative posts. This source is best-effort: when
//! every community fails, an explicit `available:false` overview is
//! persisted instead of the previous snapshot.

use crate::classify::categorize;
use crate::http::{sleep_ms, HttpClient};
use crate::sentiment::{analyze, classify, SentimentClass};
use crate::stats::day_key;
use crate::{FetcherError, Result, SocialConfig};
use chrono::{DateTime, Utc};
use ecopulse_store::{
    keys, ComplaintCategory, DailySentiment, NegativeItem, SocialOverview, SocialPost, Store,
};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Most negative posts kept on the overview.
const NEGATIVE_SAMPLE_SIZE: usize = 20;
/// Post bodies are truncated to keep snapshots bounded.
const BODY_TRUNCATE_CHARS: usize = 500;

#[derive(Debug, serde::Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, serde::Deserialize)]
struct ListingData {
    children: Vec<PostWrapper>,
    after: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct PostWrapper {
    data: PostData,
}

#[derive(Debug, serde::Deserialize)]
struct PostData {
    title: String,
    permalink: String,
    subreddit: String,
    score: i64,
    num_comments: u64,
    created_utc: f64,
    #[serde(default)]
    selftext: Option<String>,
}

pub struct SocialFetcher {
    client: HttpClient,
    config: SocialConfig,
}

impl SocialFetcher {
    pub fn new(config: SocialConfig, user_agent: &str) -> Result<Self> {
        let client = HttpClient::new(user_agent, HeaderMap::new(), config.max_retries)?;
        Ok(Self { client, config })
    }

    /// Fetch all configured communities; individual failures are skipped.
    /// When nothing at all could be fetched, writes the `available:false`
    /// placeholder and reports the source as failed.
    pub async fn fetch(&self, store: &Store) -> Result<SocialOverview> {
        let cutoff = Utc::now().timestamp() - self.config.lookback_days * 24 * 60 * 60;
        let mut posts = Vec::new();

        for community in &self.config.communities {
            match self.fetch_community(community, cutoff).await {
                Ok(batch) => {
                    info!(community = %community, posts = batch.len(), "Fetched community posts");
                    posts.extend(batch);
                }
                Err(e) => {
                    warn!(community = %community, error = %e, "Failed to fetch community, skipping");
                }
            }

            // Extra delay between communities.
            sleep_ms(self.config.request_delay_ms * 2).await;
        }

        if posts.is_empty() {
            let overview = SocialOverview::unavailable("failed to fetch any social data");
            store.set(keys::SOCIAL_OVERVIEW, &overview).await;
            return Err(FetcherError::Unavailable(
                "failed to fetch any social data".to_string(),
            ));
        }

        let overview = summarize(posts);
        store.set(keys::SOCIAL_OVERVIEW, &overview).await;
        Ok(overview)
    }

    /// Page through a community's recent posts. Listings are
    /// reverse-chronological, so the first post older than the cutoff
    /// ends the community.
    async fn fetch_community(&self, community: &str, cutoff: i64) -> Result<Vec<SocialPost>> {
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        for _page in 0..self.config.max_pages {
            let mut url = format!("{}/r/{}/new.json?limit=100", self.config.host, community);
            if let Some(ref token) = after {
                url.push_str(&format!("&after={}", token));
            }

            let response = self.client.get(&url).await?;
            if !response.status().is_success() {
                if posts.is_empty() {
                    return Err(FetcherError::Api(format!(
                        "listing returned {} for {}",
                        response.status(),
                        community
                    )));
                }
                break;
            }

            let listing: Listing = response.json().await?;

            for child in listing.data.children {
                let post = child.data;
                let created_utc = post.created_utc as i64;

                if created_utc < cutoff {
                    return Ok(posts);
                }

                let body = post.selftext.filter(|s| !s.is_empty());
                let text = match &body {
                    Some(body) => format!("{} {}", post.title, body),
                    None => post.title.clone(),
                };
                let sentiment = analyze(&text);

                posts.push(SocialPost {
                    title: post.title,
                    url: format!("https://reddit.com{}", post.permalink),
                    community: post.subreddit,
                    score: post.score,
                    num_comments: post.num_comments,
                    created_utc,
                    body: body.map(|s| s.chars().take(BODY_TRUNCATE_CHARS).collect()),
                    sentiment: sentiment.score,
                });
            }

            after = listing.data.after;
            if after.is_none() {
                break;
            }

            sleep_ms(self.config.request_delay_ms).await;
        }

        Ok(posts)
    }
}

/// Aggregate scored posts into the social overview.
pub fn summarize(posts: Vec<SocialPost>) -> SocialOverview {
    let total = posts.len() as u64;
    let average_sentiment = (total > 0)
        .then(|| posts.iter().map(|p| p.sentiment).sum::<f64>() / total as f64);

    let negative: Vec<&SocialPost> = posts
        .iter()
        .filter(|p| classify(p.sentiment) == SentimentClass::Negative)
        .collect();
    let negative_share_percent =
        (total > 0).then(|| negative.len() as f64 / total as f64 * 100.0);

    let mut daily: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for post in &posts {
        let date = DateTime::<Utc>::from_timestamp(post.created_utc, 0)
            .map(day_key)
            .unwrap_or_default();
        let entry = daily.entry(date).or_default();
        entry.0 += post.sentiment;
        entry.1 += 1;
    }

    let mut category_counts: BTreeMap<String, u64> = ComplaintCategory::ALL
        .iter()
        .map(|c| (c.as_key().to_string(), 0))
        .collect();
    for post in &posts {
        let text = match &post.body {
            Some(body) => format!("{} {}", post.title, body),
            None => post.title.clone(),
        };
        if let Some(category) = categorize(&text) {
            *category_counts.entry(category.as_key().to_string()).or_default() += 1;
        }
    }

    let mut top_negative: Vec<NegativeItem> = negative
        .iter()
        .map(|p| NegativeItem {
            title: p.title.clone(),
            url: p.url.clone(),
            community: p.community.clone(),
            sentiment: p.sentiment,
            source: None,
        })
        .collect();
    top_negative.sort_by(|a, b| {
        a.sentiment.partial_cmp(&b.sentiment).unwrap_or(std::cmp::Ordering::Equal)
    });
    top_negative.truncate(NEGATIVE_SAMPLE_SIZE);

    SocialOverview {
        available: true,
        total_posts_last30d: total,
        average_sentiment,
        negative_share_percent,
        daily_sentiment: daily
            .into_iter()
            .map(|(date, (sum, count))| DailySentiment {
                date,
                avg_sentiment: sum / count as f64,
                post_count: count,
            })
            .collect(),
        complaint_category_counts: category_counts,
        top_negative_items: top_negative,
        fetched_at: Utc::now(),
        error: None,
    }
}
