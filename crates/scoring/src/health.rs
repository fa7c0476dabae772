//! Composite health score.
//!
//! Four weighted components derived from the issue-tracker and community
//! overviews. Missing upstream data falls back to neutral defaults; when
//! sentiment is unavailable its weight is redistributed evenly over the
//! other three components so the weights keep summing to 1.0.

use chrono::Utc;
use ecopulse_store::{
    CommunityOverview, HealthComponent, HealthComponents, HealthScore, IssueOverview,
    SentimentComponent,
};

#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub responsiveness: f64,
    pub closure_ratio: f64,
    pub community_sentiment: f64,
    pub complaint_severity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Normalization {
    /// First-response times at or beyond this score 0.
    pub max_first_response_hours: f64,
    /// Closure ratios are capped here before scaling.
    pub max_closure_ratio: f64,
    pub sentiment_min: f64,
    pub sentiment_max: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreConfig {
    pub weights: Weights,
    pub normalization: Normalization,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            weights: Weights {
                responsiveness: 0.35,
                closure_ratio: 0.25,
                community_sentiment: 0.20,
                complaint_severity: 0.20,
            },
            normalization: Normalization {
                max_first_response_hours: 168.0,
                max_closure_ratio: 1.2,
                sentiment_min: -3.0,
                sentiment_max: 3.0,
            },
        }
    }
}

fn clamp_score(score: f64) -> u32 {
    score.round().clamp(0.0, 100.0) as u32
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Inverse linear scale over median time to first response: 0h scores
/// 100, the normalization cap scores 0.
fn responsiveness(median_hours: Option<f64>, norm: &Normalization) -> (u32, Option<f64>, String) {
    let Some(hours) = median_hours else {
        return (50, None, "No response time data available".to_string());
    };

    let capped = hours.min(norm.max_first_response_hours);
    let score = clamp_score(100.0 * (1.0 - capped / norm.max_first_response_hours));
    (score, Some(hours), format!("Median first response: {}h", round1(hours)))
}

fn closure_ratio(opened: u64, closed: u64, norm: &Normalization) -> (u32, Option<f64>, String) {
    if opened == 0 {
        return (100, None, "No issues opened in period".to_string());
    }

    let ratio = closed as f64 / opened as f64;
    let capped = ratio.min(norm.max_closure_ratio);
    let score = clamp_score(capped / norm.max_closure_ratio * 100.0);
    (
        score,
        Some(ratio),
        format!("Closure ratio: {} ({closed} closed / {opened} opened)", round2(ratio)),
    )
}

fn sentiment(avg: Option<f64>, norm: &Normalization) -> (u32, Option<f64>, bool, String) {
    let Some(avg) = avg else {
        return (0, None, false, "Sentiment data not available".to_string());
    };

    let normalized = (avg - norm.sentiment_min) / (norm.sentiment_max - norm.sentiment_min);
    let score = clamp_score(normalized * 100.0);
    (score, Some(avg), true, format!("Average sentiment: {}", round2(avg)))
}

fn complaint_severity(
    negative_share_percent: Option<f64>,
    total_complaints: u64,
) -> (u32, Option<f64>, String) {
    let Some(share) = negative_share_percent.filter(|_| total_complaints > 0) else {
        return (70, None, "Complaint data not available".to_string());
    };

    let score = clamp_score(100.0 - share.min(50.0) * 2.0);
    (
        score,
        Some(share),
        format!("{}% of content classified as negative", round1(share)),
    )
}

/// Compute the composite score. Infallible: any missing input degrades to
/// that component's neutral default.
pub fn compute_health(
    issues: Option<&IssueOverview>,
    community: Option<&CommunityOverview>,
    config: &ScoreConfig,
) -> HealthScore {
    let norm = &config.normalization;

    let (resp_score, resp_raw, resp_desc) = responsiveness(
        issues.and_then(|i| i.overall_median_first_response_hours),
        norm,
    );
    let (close_score, close_raw, close_desc) = closure_ratio(
        issues.map(|i| i.total_opened_last30d).unwrap_or(0),
        issues.map(|i| i.total_closed_last30d).unwrap_or(0),
        norm,
    );
    let (sent_score, sent_raw, sent_available, sent_desc) =
        sentiment(community.and_then(|c| c.overall_sentiment), norm);

    let total_complaints: u64 = community
        .map(|c| c.combined_complaint_categories.values().sum())
        .unwrap_or(0);
    let (sev_score, sev_raw, sev_desc) = complaint_severity(
        community
            .and_then(|c| c.social.as_ref())
            .and_then(|s| s.negative_share_percent),
        total_complaints,
    );

    let mut weights = config.weights;
    if !sent_available {
        let each = weights.community_sentiment / 3.0;
        weights = Weights {
            responsiveness: weights.responsiveness + each,
            closure_ratio: weights.closure_ratio + each,
            community_sentiment: 0.0,
            complaint_severity: weights.complaint_severity + each,
        };
    }

    let overall = clamp_score(
        resp_score as f64 * weights.responsiveness
            + close_score as f64 * weights.closure_ratio
            + sent_score as f64 * weights.community_sentiment
            + sev_score as f64 * weights.complaint_severity,
    );

    HealthScore {
        overall,
        components: HealthComponents {
            responsiveness: HealthComponent {
                score: resp_score,
                weight: weights.responsiveness,
                raw_value: resp_raw,
                description: resp_desc,
            },
            closure_ratio: HealthComponent {
                score: close_score,
                weight: weights.closure_ratio,
                raw_value: close_raw,
                description: close_desc,
            },
            community_sentiment: SentimentComponent {
                score: sent_score,
                weight: weights.community_sentiment,
                raw_value: sent_raw,
                available: sent_available,
                description: sent_desc,
            },
            complaint_severity: HealthComponent {
                score: sev_score,
                weight: weights.complaint_severity,
                raw_value: sev_raw,
                description: sev_desc,
            },
        },
        calculated_at: Utc::now(),
    }
}
