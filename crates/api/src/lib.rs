//! Ecopulse Web API
//!
//! Axum-based REST surface over the persisted snapshots, plus an endpoint
//! to trigger a refresh run.

mod handlers;
mod routes;

pub use routes::create_router;

use ecopulse_fetcher::FetcherConfig;
use ecopulse_scoring::ScoreConfig;
use ecopulse_store::Store;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub fetcher_config: FetcherConfig,
    pub score_config: ScoreConfig,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            fetcher_config: FetcherConfig::default(),
            score_config: ScoreConfig::default(),
        }
    }
}

pub type SharedState = Arc<AppState>;
