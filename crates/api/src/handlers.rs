//! API request handlers

use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use ecopulse_refresh::{refresh_metadata, run_refresh};
use ecopulse_store::{
    keys, CommunityOverview, HealthScore, IssueOverview, RefreshMetadata, RepoReport,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::NOT_FOUND,
            Json(Self {
                success: false,
                data: None,
                error: Some(message.into()),
            }),
        )
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Everything the dashboard front page needs in one payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<HealthScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<IssueOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<CommunityOverview>,
    pub refresh: RefreshMetadata,
}

/// Combined overview: health score, issue and community overviews, and
/// refresh metadata
pub async fn get_overview(State(state): State<SharedState>) -> impl IntoResponse {
    let health_score = state.store.get::<HealthScore>(keys::HEALTH_SCORE).await;
    let issues = state.store.get::<IssueOverview>(keys::ISSUES_OVERVIEW).await;
    let community = state.store.get::<CommunityOverview>(keys::COMMUNITY_OVERVIEW).await;

    if health_score.is_none() && issues.is_none() && community.is_none() {
        return ApiResponse::<()>::not_found("No metrics available yet; run a refresh first")
            .into_response();
    }

    ApiResponse::ok(DashboardOverview {
        health_score,
        issues,
        community,
        refresh: refresh_metadata(&state.store).await,
    })
    .into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesPayload {
    pub overview: IssueOverview,
    pub repos: Vec<RepoReport>,
}

/// Issue-tracker overview plus the per-repository reports
pub async fn get_issues(State(state): State<SharedState>) -> impl IntoResponse {
    let Some(overview) = state.store.get::<IssueOverview>(keys::ISSUES_OVERVIEW).await else {
        return ApiResponse::<()>::not_found("No issue data available yet").into_response();
    };

    let mut repos = Vec::new();
    for key in state.store.keys(keys::ISSUES_REPO_PREFIX).await {
        if let Some(report) = state.store.get::<RepoReport>(&key).await {
            repos.push(report);
        }
    }
    repos.sort_by(|a, b| a.owner.cmp(&b.owner).then_with(|| a.repo.cmp(&b.repo)));

    ApiResponse::ok(IssuesPayload { overview, repos }).into_response()
}

/// Combined forum + social community overview
pub async fn get_community(State(state): State<SharedState>) -> impl IntoResponse {
    match state.store.get::<CommunityOverview>(keys::COMMUNITY_OVERVIEW).await {
        Some(overview) => ApiResponse::ok(overview).into_response(),
        None => ApiResponse::<()>::not_found("No community data available yet").into_response(),
    }
}

/// Run the full refresh pipeline. Always returns 200; the outcome's
/// status field conveys degradation.
pub async fn trigger_refresh(State(state): State<SharedState>) -> impl IntoResponse {
    info!("Refresh triggered via API");
    let outcome = run_refresh(&state.store, &state.fetcher_config, &state.score_config).await;
    ApiResponse::ok(outcome).into_response()
}
