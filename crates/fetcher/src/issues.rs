//! Issue-tracker fetcher.
//!
//! Paginates recently-modified issues per configured repository, derives
//! per-repo reports (daily open/close histograms, response and close time
//! medians plus bucketed distributions, label and discussion rankings) and
//! aggregates them into one cross-repo overview.

use crate::http::{sleep_ms, HttpClient};
use crate::stats::{bucketize, day_key, days_between, median, Bucket};
use crate::{FetcherError, IssueTrackerConfig, RepoRef, Result};
use chrono::{DateTime, Duration, Utc};
use ecopulse_store::{
    keys, DailyIssueStat, DiscussedIssue, IssueOverview, LabelCount, RepoReport, RepoSummary,
    Store,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

const RESPONSE_BUCKETS: [Bucket; 6] = [
    Bucket { label: "<1h", max: 1.0 },
    Bucket { label: "1-4h", max: 4.0 },
    Bucket { label: "4-24h", max: 24.0 },
    Bucket { label: "1-3d", max: 72.0 },
    Bucket { label: "3-7d", max: 168.0 },
    Bucket { label: ">7d", max: f64::INFINITY },
];

const CLOSE_BUCKETS: [Bucket; 6] = [
    Bucket { label: "<1d", max: 24.0 },
    Bucket { label: "1-3d", max: 72.0 },
    Bucket { label: "3-7d", max: 168.0 },
    Bucket { label: "1-2w", max: 336.0 },
    Bucket { label: "2-4w", max: 672.0 },
    Bucket { label: ">4w", max: f64::INFINITY },
];

/// Issues with comments sampled per repo for first-response timing.
const RESPONSE_SAMPLE_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    html_url: String,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    comments: u64,
    #[serde(default)]
    labels: Vec<LabelRef>,
    /// Present when the "issue" is actually a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LabelRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RepoInfoResponse {
    #[serde(default)]
    open_issues_count: u64,
}

/// Issue-tracker API client.
pub struct IssueFetcher {
    client: HttpClient,
    config: IssueTrackerConfig,
}

impl IssueFetcher {
    pub fn new(config: IssueTrackerConfig, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        if let Some(ref token) = config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FetcherError::Parse(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = HttpClient::new(user_agent, headers, config.max_retries)?;
        Ok(Self { client, config })
    }

    /// Fetch every configured repository, persisting per-repo reports as
    /// they complete, and aggregate into one overview. A repo that fails
    /// is skipped; the fetch as a whole fails only when no repo succeeded.
    pub async fn fetch_all(&self, store: &Store) -> Result<IssueOverview> {
        let mut reports = Vec::new();

        for repo in &self.config.repos {
            match self.fetch_repo(repo).await {
                Ok(report) => {
                    info!(
                        owner = %repo.owner,
                        repo = %repo.repo,
                        opened_30d = report.issues_opened_last30d,
                        "Fetched repository issues"
                    );
                    store.set(&keys::issues_repo(&repo.owner, &repo.repo), &report).await;
                    reports.push(report);
                }
                Err(e) => {
                    warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "Failed to fetch repository, skipping");
                }
            }

            sleep_ms(self.config.request_delay_ms).await;
        }

        if reports.is_empty() {
            return Err(FetcherError::Unavailable(
                "failed to fetch any issue-tracker repositories".to_string(),
            ));
        }

        let overview = aggregate_reports(&reports);
        store.set(keys::ISSUES_OVERVIEW, &overview).await;
        Ok(overview)
    }

    /// Build the full report for a single repository.
    async fn fetch_repo(&self, repo: &RepoRef) -> Result<RepoReport> {
        let now = Utc::now();
        let since = now - Duration::days(self.config.lookback_days);

        debug!(owner = %repo.owner, repo = %repo.repo, "Fetching issues");
        let issues = self.fetch_issues_since(repo, since).await?;
        let open_issues_count = self.fetch_open_count(repo).await?;

        let in_range: Vec<&IssueResponse> =
            issues.iter().filter(|i| i.created_at >= since).collect();

        let daily_stats = build_daily_stats(&in_range, since, now);
        let issues_opened = in_range.len() as u64;
        let issues_closed = in_range.iter().filter(|i| i.closed_at.is_some()).count() as u64;

        let top_labels = rank_labels(&in_range);
        let most_discussed = rank_by_comments(&in_range);

        let response_hours = self.sample_first_response_hours(repo, &in_range).await;
        let close_hours: Vec<f64> = in_range
            .iter()
            .filter_map(|i| i.closed_at.map(|closed| hours_between(i.created_at, closed)))
            .filter(|&h| h >= 0.0)
            .collect();

        Ok(RepoReport {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            open_issues_count,
            issues_opened_last30d: issues_opened,
            issues_closed_last30d: issues_closed,
            median_time_to_first_response_hours: median(&response_hours),
            median_time_to_close_hours: median(&close_hours),
            top_labels,
            daily_stats,
            most_discussed_issues: most_discussed,
            time_to_first_response_distribution: bucketize(&response_hours, &RESPONSE_BUCKETS),
            time_to_close_distribution: bucketize(&close_hours, &CLOSE_BUCKETS),
            fetched_at: Utc::now(),
        })
    }

    /// Paginate all issues modified since the cutoff, excluding PRs.
    async fn fetch_issues_since(
        &self,
        repo: &RepoRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueResponse>> {
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/issues?state=all&since={}&per_page=100&page={}&sort=created&direction=desc",
                self.config.api_base,
                repo.owner,
                repo.repo,
                since.format("%Y-%m-%dT%H:%M:%SZ"),
                page,
            );

            let response = self.client.get(&url).await?;

            // A missing repository is an empty one, not a failure.
            if response.status() == StatusCode::NOT_FOUND {
                debug!(owner = %repo.owner, repo = %repo.repo, "Repository not found, treating as empty");
                return Ok(issues);
            }

            if !response.status().is_success() {
                return Err(FetcherError::Api(format!(
                    "issue list returned {} for {}/{}",
                    response.status(),
                    repo.owner,
                    repo.repo
                )));
            }

            let has_next = has_next_page(response.headers());
            let batch: Vec<IssueResponse> = response.json().await?;
            issues.extend(batch.into_iter().filter(|i| i.pull_request.is_none()));

            if !has_next {
                break;
            }

            page += 1;
            sleep_ms(self.config.request_delay_ms).await;
        }

        Ok(issues)
    }

    /// Current open-issue count; degrades to 0 when the repo-info
    /// endpoint is unavailable so a lookup failure never drops the repo.
    async fn fetch_open_count(&self, repo: &RepoRef) -> Result<u64> {
        let url = format!("{}/repos/{}/{}", self.config.api_base, repo.owner, repo.repo);
        let response = self.client.get(&url).await?;

        if !response.status().is_success() {
            debug!(
                owner = %repo.owner,
                repo = %repo.repo,
                status = %response.status(),
                "Repo info unavailable, defaulting open count to 0"
            );
            return Ok(0);
        }

        let info: RepoInfoResponse = response.json().await?;
        Ok(info.open_issues_count)
    }

    /// First-response times for a bounded sample of commented issues.
    /// Each lookup is its own request, spaced by the configured delay;
    /// failures just shrink the sample.
    async fn sample_first_response_hours(
        &self,
        repo: &RepoRef,
        issues: &[&IssueResponse],
    ) -> Vec<f64> {
        let mut hours = Vec::new();

        for issue in issues.iter().filter(|i| i.comments > 0).take(RESPONSE_SAMPLE_SIZE) {
            sleep_ms(self.config.request_delay_ms).await;

            match self.fetch_first_comment(repo, issue.number).await {
                Ok(Some(comment)) => {
                    let delta = hours_between(issue.created_at, comment.created_at);
                    if delta >= 0.0 {
                        hours.push(delta);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(issue = issue.number, error = %e, "First-comment lookup failed");
                }
            }
        }

        hours
    }

    async fn fetch_first_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Option<CommentResponse>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments?per_page=1",
            self.config.api_base, repo.owner, repo.repo, issue_number
        );

        let response = self.client.get(&url).await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let mut comments: Vec<CommentResponse> = response.json().await?;
        Ok(if comments.is_empty() { None } else { Some(comments.remove(0)) })
    }
}

fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|link| link.contains("rel=\"next\""))
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

/// Per-day opened/closed histogram over the full window: every day is
/// present even when zero.
fn build_daily_stats(
    issues: &[&IssueResponse],
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DailyIssueStat> {
    let mut by_day: BTreeMap<String, (u64, u64)> = days_between(since, now)
        .into_iter()
        .map(|day| (day, (0, 0)))
        .collect();

    for issue in issues {
        if let Some(entry) = by_day.get_mut(&day_key(issue.created_at)) {
            entry.0 += 1;
        }
        if let Some(closed) = issue.closed_at {
            if let Some(entry) = by_day.get_mut(&day_key(closed)) {
                entry.1 += 1;
            }
        }
    }

    by_day
        .into_iter()
        .map(|(date, (opened, closed))| DailyIssueStat { date, opened, closed })
        .collect()
}

fn rank_labels(issues: &[&IssueResponse]) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for issue in issues {
        for label in &issue.labels {
            *counts.entry(label.name.as_str()).or_default() += 1;
        }
    }

    let mut ranked: Vec<LabelCount> = counts
        .into_iter()
        .map(|(name, count)| LabelCount { name: name.to_string(), count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(10);
    ranked
}

fn rank_by_comments(issues: &[&IssueResponse]) -> Vec<DiscussedIssue> {
    let mut ranked: Vec<DiscussedIssue> = issues
        .iter()
        .map(|i| DiscussedIssue {
            title: i.title.clone(),
            url: i.html_url.clone(),
            comments: i.comments,
            number: i.number,
        })
        .collect();
    ranked.sort_by(|a, b| b.comments.cmp(&a.comments));
    ranked.truncate(10);
    ranked
}

/// Merge per-repo reports into the cross-repo overview. The overall
/// medians are medians of the per-repo medians, not of raw values.
pub fn aggregate_reports(reports: &[RepoReport]) -> IssueOverview {
    let mut daily: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for report in reports {
        for stat in &report.daily_stats {
            let entry = daily.entry(stat.date.clone()).or_default();
            entry.0 += stat.opened;
            entry.1 += stat.closed;
        }
    }

    let aggregated_daily_stats: Vec<DailyIssueStat> = daily
        .into_iter()
        .map(|(date, (opened, closed))| DailyIssueStat { date, opened, closed })
        .collect();

    let seven_days_ago = day_key(Utc::now() - Duration::days(7));
    let (total_opened_last7d, total_closed_last7d) = aggregated_daily_stats
        .iter()
        .filter(|s| s.date >= seven_days_ago)
        .fold((0, 0), |(o, c), s| (o + s.opened, c + s.closed));

    let response_medians: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.median_time_to_first_response_hours)
        .collect();
    let close_medians: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.median_time_to_close_hours)
        .collect();

    IssueOverview {
        total_open_issues: reports.iter().map(|r| r.open_issues_count).sum(),
        total_opened_last7d,
        total_closed_last7d,
        total_opened_last30d: reports.iter().map(|r| r.issues_opened_last30d).sum(),
        total_closed_last30d: reports.iter().map(|r| r.issues_closed_last30d).sum(),
        overall_median_first_response_hours: median(&response_medians),
        overall_median_close_hours: median(&close_medians),
        repo_summaries: reports
            .iter()
            .map(|r| RepoSummary {
                owner: r.owner.clone(),
                repo: r.repo.clone(),
                open_issues: r.open_issues_count,
                opened_30d: r.issues_opened_last30d,
                closed_30d: r.issues_closed_last30d,
            })
            .collect(),
        aggregated_daily_stats,
        fetched_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopulse_store::BucketCount;

    fn report(owner: &str, median_response: Option<f64>, daily: Vec<DailyIssueStat>) -> RepoReport {
        RepoReport {
            owner: owner.to_string(),
            repo: "r".to_string(),
            open_issues_count: 5,
            issues_opened_last30d: daily.iter().map(|d| d.opened).sum(),
            issues_closed_last30d: daily.iter().map(|d| d.closed).sum(),
            median_time_to_first_response_hours: median_response,
            median_time_to_close_hours: None,
            top_labels: vec![],
            daily_stats: daily,
            most_discussed_issues: vec![],
            time_to_first_response_distribution: vec![],
            time_to_close_distribution: vec![],
            fetched_at: Utc::now(),
        }
    }

    fn stat(date: &str, opened: u64, closed: u64) -> DailyIssueStat {
        DailyIssueStat { date: date.to_string(), opened, closed }
    }

    #[test]
    fn aggregation_sums_daily_stats_by_date() {
        let yesterday = day_key(Utc::now() - Duration::days(1));
        let a = report("a", None, vec![stat(&yesterday, 2, 1)]);
        let b = report("b", None, vec![stat(&yesterday, 3, 4)]);

        let overview = aggregate_reports(&[a, b]);
        assert_eq!(overview.aggregated_daily_stats.len(), 1);
        assert_eq!(overview.aggregated_daily_stats[0].opened, 5);
        assert_eq!(overview.aggregated_daily_stats[0].closed, 5);
        assert_eq!(overview.total_opened_last30d, 5);
        assert_eq!(overview.total_open_issues, 10);
    }

    #[test]
    fn seven_day_totals_exclude_older_days() {
        let recent = day_key(Utc::now() - Duration::days(2));
        let old = day_key(Utc::now() - Duration::days(20));
        let r = report("a", None, vec![stat(&recent, 4, 2), stat(&old, 10, 10)]);

        let overview = aggregate_reports(&[r]);
        assert_eq!(overview.total_opened_last7d, 4);
        assert_eq!(overview.total_closed_last7d, 2);
        assert_eq!(overview.total_opened_last30d, 14);
    }

    #[test]
    fn overall_median_is_median_of_per_repo_medians() {
        let reports = vec![
            report("a", Some(2.0), vec![]),
            report("b", Some(10.0), vec![]),
            report("c", Some(4.0), vec![]),
            report("d", None, vec![]),
        ];

        let overview = aggregate_reports(&reports);
        // Median over [2, 10, 4]; the repo without data is excluded.
        assert_eq!(overview.overall_median_first_response_hours, Some(4.0));
    }

    #[test]
    fn missing_repo_contributes_a_zeroed_summary() {
        // A repository whose endpoints 404 produces an empty report
        // (no issues, open count 0, no medians). It must still show up
        // in the overview instead of counting as a source failure.
        let gone = RepoReport {
            owner: "gone".to_string(),
            repo: "r".to_string(),
            open_issues_count: 0,
            issues_opened_last30d: 0,
            issues_closed_last30d: 0,
            median_time_to_first_response_hours: None,
            median_time_to_close_hours: None,
            top_labels: vec![],
            daily_stats: vec![],
            most_discussed_issues: vec![],
            time_to_first_response_distribution: vec![],
            time_to_close_distribution: vec![],
            fetched_at: Utc::now(),
        };

        let overview = aggregate_reports(&[gone]);
        assert_eq!(overview.repo_summaries.len(), 1);
        assert_eq!(overview.repo_summaries[0].owner, "gone");
        assert_eq!(overview.repo_summaries[0].open_issues, 0);
        assert_eq!(overview.total_opened_last30d, 0);
        assert_eq!(overview.overall_median_first_response_hours, None);
    }

    #[test]
    fn response_buckets_place_value_in_first_exceeding_bound() {
        let counts = bucketize(&[0.2, 1.0, 5.0, 200.0], &RESPONSE_BUCKETS);
        assert_eq!(counts[0], BucketCount { bucket: "<1h".into(), count: 1 });
        assert_eq!(counts[1], BucketCount { bucket: "1-4h".into(), count: 1 });
        assert_eq!(counts[2], BucketCount { bucket: "4-24h".into(), count: 1 });
        assert_eq!(counts[5], BucketCount { bucket: ">7d".into(), count: 1 });
    }
}
