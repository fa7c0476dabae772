//! Persisted snapshot models.
//!
//! Everything here is an immutable snapshot replaced wholesale on each
//! refresh and read back by the dashboard, so the JSON field names follow
//! the dashboard's camelCase convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complaint buckets in dispatch-priority order: classification tries each
/// bucket top to bottom and the first keyword hit wins, so the declared
/// order is a real tie-break policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    SnapsSecurity,
    UpdatesBreakage,
    Performance,
    EnterpriseSupport,
    PackagingDevWorkflow,
}

impl ComplaintCategory {
    pub const ALL: [ComplaintCategory; 5] = [
        ComplaintCategory::SnapsSecurity,
        ComplaintCategory::UpdatesBreakage,
        ComplaintCategory::Performance,
        ComplaintCategory::EnterpriseSupport,
        ComplaintCategory::PackagingDevWorkflow,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            ComplaintCategory::SnapsSecurity => "snaps_security",
            ComplaintCategory::UpdatesBreakage => "updates_breakage",
            ComplaintCategory::Performance => "performance",
            ComplaintCategory::EnterpriseSupport => "enterprise_support",
            ComplaintCategory::PackagingDevWorkflow => "packaging_dev_workflow",
        }
    }
}

/// Issues opened/closed on one calendar day (UTC, `YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyIssueStat {
    pub date: String,
    pub opened: u64,
    pub closed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussedIssue {
    pub title: String,
    pub url: String,
    pub comments: u64,
    pub number: u64,
}

/// One bar of a fixed-bucket duration histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: String,
    pub count: u64,
}

/// Per-repository issue-tracker report for the lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoReport {
    pub owner: String,
    pub repo: String,
    pub open_issues_count: u64,
    pub issues_opened_last30d: u64,
    pub issues_closed_last30d: u64,
    pub median_time_to_first_response_hours: Option<f64>,
    pub median_time_to_close_hours: Option<f64>,
    pub top_labels: Vec<LabelCount>,
    pub daily_stats: Vec<DailyIssueStat>,
    pub most_discussed_issues: Vec<DiscussedIssue>,
    pub time_to_first_response_distribution: Vec<BucketCount>,
    pub time_to_close_distribution: Vec<BucketCount>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub owner: String,
    pub repo: String,
    pub open_issues: u64,
    #[serde(rename = "opened30d")]
    pub opened_30d: u64,
    #[serde(rename = "closed30d")]
    pub closed_30d: u64,
}

/// Cross-repo issue-tracker overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOverview {
    pub total_open_issues: u64,
    pub total_opened_last7d: u64,
    pub total_closed_last7d: u64,
    pub total_opened_last30d: u64,
    pub total_closed_last30d: u64,
    pub overall_median_first_response_hours: Option<f64>,
    pub overall_median_close_hours: Option<f64>,
    pub repo_summaries: Vec<RepoSummary>,
    pub aggregated_daily_stats: Vec<DailyIssueStat>,
    pub fetched_at: DateTime<Utc>,
}

/// One forum topic kept in the recent sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCount {
    /// Monday of the ISO week, `YYYY-MM-DD`.
    pub week: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumOverview {
    pub total_topics_last30d: u64,
    pub topics_per_week: Vec<WeeklyCount>,
    pub keyword_matches: BTreeMap<String, u64>,
    pub complaint_category_counts: BTreeMap<String, u64>,
    pub recent_items: Vec<ForumItem>,
    pub fetched_at: DateTime<Utc>,
}

/// One social post after sentiment analysis. Body is truncated at fetch
/// time; only a bounded sample of posts survives aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub title: String,
    pub url: String,
    pub community: String,
    pub score: i64,
    pub num_comments: u64,
    pub created_utc: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySentiment {
    pub date: String,
    pub avg_sentiment: f64,
    pub post_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeItem {
    pub title: String,
    pub url: String,
    pub community: String,
    pub sentiment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Social source overview. `available == false` means every community
/// fetch failed this cycle: numeric fields are zero/None, `error` carries
/// the reason, and the scorer must redistribute the sentiment weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialOverview {
    pub available: bool,
    pub total_posts_last30d: u64,
    pub average_sentiment: Option<f64>,
    pub negative_share_percent: Option<f64>,
    pub daily_sentiment: Vec<DailySentiment>,
    pub complaint_category_counts: BTreeMap<String, u64>,
    pub top_negative_items: Vec<NegativeItem>,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SocialOverview {
    /// Placeholder written when the whole social source is down.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            available: false,
            total_posts_last30d: 0,
            average_sentiment: None,
            negative_share_percent: None,
            daily_sentiment: Vec::new(),
            complaint_category_counts: BTreeMap::new(),
            top_negative_items: Vec::new(),
            fetched_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Merge of forum and social overviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum: Option<ForumOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialOverview>,
    pub combined_complaint_categories: BTreeMap<String, u64>,
    pub top_complaint_category: Option<String>,
    pub overall_sentiment: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthComponent {
    pub score: u32,
    pub weight: f64,
    pub raw_value: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentComponent {
    pub score: u32,
    pub weight: f64,
    pub raw_value: Option<f64>,
    pub available: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthComponents {
    pub responsiveness: HealthComponent,
    pub closure_ratio: HealthComponent,
    pub community_sentiment: SentimentComponent,
    pub complaint_severity: HealthComponent,
}

/// Composite health score. Component weights always sum to 1.0, including
/// after sentiment-weight redistribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub overall: u32,
    pub components: HealthComponents,
    pub calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Ok,
    Partial,
    Fail,
}

impl std::fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStatus::Ok => write!(f, "ok"),
            RefreshStatus::Partial => write!(f, "partial"),
            RefreshStatus::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshError {
    pub source: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of one orchestrated refresh run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub status: RefreshStatus,
    pub errors: Vec<RefreshError>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshMetadata {
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_status: Option<RefreshStatus>,
    pub last_errors: Vec<RefreshError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_follow_declared_order() {
        let keys: Vec<_> = ComplaintCategory::ALL.iter().map(|c| c.as_key()).collect();
        assert_eq!(
            keys,
            [
                "snaps_security",
                "updates_breakage",
                "performance",
                "enterprise_support",
                "packaging_dev_workflow",
            ]
        );
    }

    #[test]
    fn refresh_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RefreshStatus::Partial).unwrap(), "\"partial\"");
        let parsed: RefreshStatus = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(parsed, RefreshStatus::Fail);
    }

    #[test]
    fn unavailable_social_overview_is_empty() {
        let overview = SocialOverview::unavailable("all communities failed");
        assert!(!overview.available);
        assert_eq!(overview.total_posts_last30d, 0);
        assert!(overview.average_sentiment.is_none());
        assert!(overview.negative_share_percent.is_none());
        assert!(overview.error.is_some());
    }
}
