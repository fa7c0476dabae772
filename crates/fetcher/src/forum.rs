//! Forum-feed fetcher.
//!
//! Pulls each configured syndication feed, extracts title/link/date/
//! categories, deduplicates across feeds by link, and derives weekly topic
//! counts, keyword tallies, and complaint-category counts.

use crate::classify::{categorize, matches_keyword, GENERAL_KEYWORDS};
use crate::http::HttpClient;
use crate::stats::week_start;
use crate::{FetcherError, ForumConfig, Result};
use chrono::{Duration, Utc};
use ecopulse_store::{keys, ComplaintCategory, ForumItem, ForumOverview, Store, WeeklyCount};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Items kept as the recent sample on the overview.
const RECENT_SAMPLE_SIZE: usize = 20;

pub struct ForumFetcher {
    client: HttpClient,
    config: ForumConfig,
}

impl ForumFetcher {
    pub fn new(config: ForumConfig, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/rss+xml, application/xml, text/xml"),
        );

        let client = HttpClient::new(user_agent, headers, config.max_retries)?;
        Ok(Self { client, config })
    }

    /// Fetch all configured feeds; a feed that fails is skipped. Fails
    /// only when no feed could be fetched, in which case the previously
    /// cached overview is left untouched.
    pub async fn fetch(&self, store: &Store) -> Result<ForumOverview> {
        let cutoff = Utc::now() - Duration::days(self.config.lookback_days);
        let mut items = Vec::new();
        let mut feeds_ok = 0usize;

        for feed in &self.config.feeds {
            match self.fetch_feed(&feed.url).await {
                Ok(entries) => {
                    feeds_ok += 1;
                    items.extend(entries.into_iter().filter(|i| i.published_at >= cutoff));
                }
                Err(e) => {
                    warn!(feed = %feed.name, error = %e, "Failed to fetch feed, skipping");
                }
            }
        }

        if feeds_ok == 0 {
            return Err(FetcherError::Unavailable(
                "failed to fetch any forum feeds".to_string(),
            ));
        }

        let unique = dedup_by_link(items);
        info!(topics = unique.len(), "Fetched forum topics in lookback window");

        let overview = summarize(unique);
        store.set(keys::FORUM_OVERVIEW, &overview).await;
        Ok(overview)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<ForumItem>> {
        let response = self.client.get(url).await?;
        if !response.status().is_success() {
            return Err(FetcherError::Api(format!(
                "feed returned {} for {}",
                response.status(),
                url
            )));
        }

        let body = response.bytes().await?;
        let feed = feed_rs::parser::parse(body.as_ref())
            .map_err(|e| FetcherError::Parse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                // Items without a title or link cannot be deduplicated or
                // displayed; drop them.
                let title = entry.title.map(|t| t.content)?;
                let link = entry.links.first().map(|l| l.href.clone())?;

                Some(ForumItem {
                    title,
                    link,
                    published_at: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
                    categories: entry.categories.into_iter().map(|c| c.term).collect(),
                })
            })
            .collect();

        Ok(items)
    }
}

/// Deduplicate across feeds by link: order follows first encounter, the
/// retained item is the last one seen for that link.
pub fn dedup_by_link(items: Vec<ForumItem>) -> Vec<ForumItem> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, ForumItem> = HashMap::new();

    for item in items {
        if !latest.contains_key(&item.link) {
            order.push(item.link.clone());
        }
        latest.insert(item.link.clone(), item);
    }

    order.into_iter().filter_map(|link| latest.remove(&link)).collect()
}

/// Derive the overview from deduplicated in-window items.
pub fn summarize(items: Vec<ForumItem>) -> ForumOverview {
    let mut weekly: BTreeMap<String, u64> = BTreeMap::new();
    for item in &items {
        let week = week_start(item.published_at.date_naive())
            .format("%Y-%m-%d")
            .to_string();
        *weekly.entry(week).or_default() += 1;
    }

    let mut keyword_matches: BTreeMap<String, u64> =
        GENERAL_KEYWORDS.iter().map(|kw| (kw.to_string(), 0)).collect();
    let mut category_counts: BTreeMap<String, u64> = ComplaintCategory::ALL
        .iter()
        .map(|c| (c.as_key().to_string(), 0))
        .collect();

    for item in &items {
        let text = format!("{} {}", item.title, item.categories.join(" "));

        for keyword in GENERAL_KEYWORDS {
            if matches_keyword(&text, keyword) {
                *keyword_matches.entry(keyword.to_string()).or_default() += 1;
            }
        }

        if let Some(category) = categorize(&text) {
            *category_counts.entry(category.as_key().to_string()).or_default() += 1;
        }
    }

    ForumOverview {
        total_topics_last30d: items.len() as u64,
        topics_per_week: weekly
            .into_iter()
            .map(|(week, count)| WeeklyCount { week, count })
            .collect(),
        keyword_matches,
        complaint_category_counts: category_counts,
        recent_items: items.into_iter().take(RECENT_SAMPLE_SIZE).collect(),
        fetched_at: Utc::now(),
    }
}
