//! Refresh orchestrator.
//!
//! Runs the three source fetchers in sequence, aggregates and scores, and
//! records run metadata. The public API is infallible: individual source
//! failures are collected into the outcome rather than propagated, and a
//! failed source falls back to the last persisted overview so downstream
//! aggregation always has the best data available.

use chrono::Utc;
use ecopulse_fetcher::forum::ForumFetcher;
use ecopulse_fetcher::issues::IssueFetcher;
use ecopulse_fetcher::social::SocialFetcher;
use ecopulse_fetcher::FetcherConfig;
use ecopulse_scoring::{aggregate_community, compute_health, ScoreConfig};
use ecopulse_store::{
    keys, ForumOverview, IssueOverview, RefreshError, RefreshMetadata, RefreshOutcome,
    RefreshStatus, SocialOverview, Store,
};
use std::time::Instant;
use tracing::{info, warn};

/// Sources whose failure degrades the refresh status. The social source
/// is rate-limited in practice and its failures are expected.
const CRITICAL_SOURCES: [&str; 2] = ["issues", "forum"];

fn record_error(errors: &mut Vec<RefreshError>, source: &str, error: impl std::fmt::Display) {
    warn!(source = %source, error = %error, "Source fetch failed");
    errors.push(RefreshError {
        source: source.to_string(),
        error: error.to_string(),
        timestamp: Utc::now(),
    });
}

/// Status from the collected errors: zero critical failures is a clean
/// run, one leaves the snapshots partially stale, two means the refresh
/// produced nothing trustworthy.
pub fn derive_status(errors: &[RefreshError]) -> RefreshStatus {
    let critical = errors
        .iter()
        .filter(|e| CRITICAL_SOURCES.contains(&e.source.as_str()))
        .count();

    match critical {
        0 => RefreshStatus::Ok,
        1 => RefreshStatus::Partial,
        _ => RefreshStatus::Fail,
    }
}

async fn fetch_issues(store: &Store, config: &FetcherConfig) -> ecopulse_fetcher::Result<IssueOverview> {
    IssueFetcher::new(config.issues.clone(), &config.user_agent)?
        .fetch_all(store)
        .await
}

async fn fetch_forum(store: &Store, config: &FetcherConfig) -> ecopulse_fetcher::Result<ForumOverview> {
    ForumFetcher::new(config.forum.clone(), &config.user_agent)?
        .fetch(store)
        .await
}

async fn fetch_social(store: &Store, config: &FetcherConfig) -> ecopulse_fetcher::Result<SocialOverview> {
    SocialFetcher::new(config.social.clone(), &config.user_agent)?
        .fetch(store)
        .await
}

/// Run one full refresh cycle. Snapshots are replaced wholesale, so
/// re-running is idempotent; concurrent runs race per key with
/// last-writer-wins semantics.
pub async fn run_refresh(
    store: &Store,
    config: &FetcherConfig,
    score_config: &ScoreConfig,
) -> RefreshOutcome {
    let started = Instant::now();
    let mut errors = Vec::new();

    info!("Starting data refresh");
    store.set(keys::REFRESH_LAST_ATTEMPT, &Utc::now()).await;

    let fresh_issues = match fetch_issues(store, config).await {
        Ok(overview) => Some(overview),
        Err(e) => {
            record_error(&mut errors, "issues", e);
            None
        }
    };

    let fresh_forum = match fetch_forum(store, config).await {
        Ok(overview) => Some(overview),
        Err(e) => {
            record_error(&mut errors, "forum", e);
            None
        }
    };

    let fresh_social = match fetch_social(store, config).await {
        Ok(overview) => Some(overview),
        Err(e) => {
            record_error(&mut errors, "social", e);
            None
        }
    };

    // Aggregate over the freshest data we have; a failed source falls
    // back to its last persisted overview.
    let forum = match fresh_forum {
        Some(overview) => Some(overview),
        None => store.get::<ForumOverview>(keys::FORUM_OVERVIEW).await,
    };
    let social = match fresh_social {
        Some(overview) => Some(overview),
        None => store.get::<SocialOverview>(keys::SOCIAL_OVERVIEW).await,
    };

    let snapshot = aggregate_community(forum, social);
    store.set(keys::COMMUNITY_OVERVIEW, &snapshot.overview).await;
    store.set(keys::COMMUNITY_NEGATIVE_ITEMS, &snapshot.negative_items).await;

    let issues = match fresh_issues {
        Some(overview) => Some(overview),
        None => store.get::<IssueOverview>(keys::ISSUES_OVERVIEW).await,
    };

    let health = compute_health(issues.as_ref(), Some(&snapshot.overview), score_config);
    store.set(keys::HEALTH_SCORE, &health).await;

    let status = derive_status(&errors);
    store.set(keys::REFRESH_LAST_STATUS, &status).await;
    store.set(keys::REFRESH_LAST_ERRORS, &errors).await;
    if status != RefreshStatus::Fail {
        store.set(keys::REFRESH_LAST_SUCCESS, &Utc::now()).await;
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(status = %status, duration_ms, errors = errors.len(), "Refresh completed");

    RefreshOutcome {
        status,
        errors,
        duration_ms,
    }
}

/// Read back the metadata of the most recent run.
pub async fn refresh_metadata(store: &Store) -> RefreshMetadata {
    RefreshMetadata {
        last_success: store.get(keys::REFRESH_LAST_SUCCESS).await,
        last_attempt: store.get(keys::REFRESH_LAST_ATTEMPT).await,
        last_status: store.get(keys::REFRESH_LAST_STATUS).await,
        last_errors: store.get(keys::REFRESH_LAST_ERRORS).await.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopulse_store::{CommunityOverview, HealthScore};
    use std::collections::BTreeMap;

    fn err(source: &str) -> RefreshError {
        RefreshError {
            source: source.to_string(),
            error: "boom".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn no_errors_is_ok() {
        assert_eq!(derive_status(&[]), RefreshStatus::Ok);
    }

    #[test]
    fn social_failure_alone_stays_ok() {
        assert_eq!(derive_status(&[err("social")]), RefreshStatus::Ok);
    }

    #[test]
    fn one_critical_failure_is_partial() {
        assert_eq!(derive_status(&[err("issues")]), RefreshStatus::Partial);
        assert_eq!(derive_status(&[err("forum"), err("social")]), RefreshStatus::Partial);
    }

    #[test]
    fn two_critical_failures_is_fail() {
        assert_eq!(derive_status(&[err("issues"), err("forum")]), RefreshStatus::Fail);
        assert_eq!(
            derive_status(&[err("issues"), err("forum"), err("social")]),
            RefreshStatus::Fail
        );
    }

    fn cached_issue_overview() -> IssueOverview {
        IssueOverview {
            total_open_issues: 12,
            total_opened_last7d: 5,
            total_closed_last7d: 4,
            total_opened_last30d: 30,
            total_closed_last30d: 30,
            overall_median_first_response_hours: Some(84.0),
            overall_median_close_hours: Some(48.0),
            repo_summaries: vec![],
            aggregated_daily_stats: vec![],
            fetched_at: Utc::now(),
        }
    }

    fn cached_forum_overview() -> ForumOverview {
        ForumOverview {
            total_topics_last30d: 7,
            topics_per_week: vec![],
            keyword_matches: BTreeMap::new(),
            complaint_category_counts: [("performance".to_string(), 3)].into_iter().collect(),
            recent_items: vec![],
            fetched_at: Utc::now(),
        }
    }

    // With no repos, feeds, or communities configured every source fails
    // without touching the network, which exercises the whole fallback
    // path of the orchestrator against cached snapshots.
    #[tokio::test]
    async fn offline_refresh_falls_back_to_cached_overviews() {
        let store = Store::memory();
        store.set(keys::ISSUES_OVERVIEW, &cached_issue_overview()).await;
        store.set(keys::FORUM_OVERVIEW, &cached_forum_overview()).await;

        let mut config = FetcherConfig::default();
        config.issues.repos.clear();
        config.forum.feeds.clear();
        config.social.communities.clear();

        let outcome = run_refresh(&store, &config, &ScoreConfig::default()).await;

        // Both critical sources failed.
        assert_eq!(outcome.status, RefreshStatus::Fail);
        assert_eq!(outcome.errors.len(), 3);

        // The social placeholder is written even on failure.
        let social: SocialOverview = store.get(keys::SOCIAL_OVERVIEW).await.unwrap();
        assert!(!social.available);
        assert!(social.error.is_some());

        // Community aggregation picked up the cached forum overview and
        // the social placeholder.
        let community: CommunityOverview = store.get(keys::COMMUNITY_OVERVIEW).await.unwrap();
        assert!(community.forum.is_some());
        assert_eq!(community.overall_sentiment, None);
        assert_eq!(community.top_complaint_category.as_deref(), Some("performance"));

        // The health score is computed from the cached issue overview:
        // 84h of 168h responsiveness, closure ratio 1.0 of cap 1.2.
        let health: HealthScore = store.get(keys::HEALTH_SCORE).await.unwrap();
        assert_eq!(health.components.responsiveness.score, 50);
        assert_eq!(health.components.closure_ratio.score, 83);
        assert!(!health.components.community_sentiment.available);
        assert_eq!(health.components.community_sentiment.weight, 0.0);

        // The attempt is recorded; success is withheld on Fail.
        let metadata = refresh_metadata(&store).await;
        assert!(metadata.last_attempt.is_some());
        assert!(metadata.last_success.is_none());
        assert_eq!(metadata.last_status, Some(RefreshStatus::Fail));
        assert_eq!(metadata.last_errors.len(), 3);
    }

    #[tokio::test]
    async fn metadata_round_trips_through_the_store() {
        let store = Store::memory();
        store.set(keys::REFRESH_LAST_STATUS, &RefreshStatus::Partial).await;
        store.set(keys::REFRESH_LAST_ERRORS, &vec![err("forum")]).await;

        let metadata = refresh_metadata(&store).await;
        assert_eq!(metadata.last_status, Some(RefreshStatus::Partial));
        assert_eq!(metadata.last_errors.len(), 1);
        assert!(metadata.last_success.is_none());
    }
}
