//! Store key namespace.
//!
//! Every persisted artifact lives under a fixed, namespaced key. Per-repo
//! reports are the only parameterized keys.

pub const REFRESH_LAST_SUCCESS: &str = "refresh:last_success";
pub const REFRESH_LAST_ATTEMPT: &str = "refresh:last_attempt";
pub const REFRESH_LAST_STATUS: &str = "refresh:last_status";
pub const REFRESH_LAST_ERRORS: &str = "refresh:last_errors";

pub const ISSUES_OVERVIEW: &str = "issues:overview:30d";
pub const FORUM_OVERVIEW: &str = "forum:overview:30d";
pub const SOCIAL_OVERVIEW: &str = "social:overview:30d";
pub const COMMUNITY_OVERVIEW: &str = "community:overview:30d";
pub const COMMUNITY_NEGATIVE_ITEMS: &str = "community:items:negative";
pub const HEALTH_SCORE: &str = "health:score";

pub const ISSUES_REPO_PREFIX: &str = "issues:repo:";

pub fn issues_repo(owner: &str, repo: &str) -> String {
    format!("{}{}_{}:30d", ISSUES_REPO_PREFIX, owner, repo)
}
