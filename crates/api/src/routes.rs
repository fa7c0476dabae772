//! API route definitions

use crate::handlers;
use crate::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

/// Create the main application router
pub fn create_router(state: SharedState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics/overview", get(handlers::get_overview))
        .route("/metrics/issues", get(handlers::get_issues))
        .route("/metrics/community", get(handlers::get_community))
        .route("/refresh", post(handlers::trigger_refresh))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
}
