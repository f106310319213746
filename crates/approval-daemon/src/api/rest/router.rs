//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Approval queue
        .route("/approvals/queue", get(handlers::list_queue))
        .route("/approvals/counts", get(handlers::status_counts))
        // Articles
        .route("/articles", post(handlers::submit_article))
        .route("/articles/:id/approval", get(handlers::get_approval_status))
        .route(
            "/articles/:id/approval-history",
            get(handlers::get_approval_history),
        )
        .route("/articles/:id/approve", post(handlers::approve_article))
        .route("/articles/:id/reject", post(handlers::reject_article))
        .route("/articles/:id/release", post(handlers::release_article))
        .route("/articles/:id/reset", post(handlers::reset_article))
        // Users
        .route("/users/:id/role", put(handlers::update_user_role))
        // Events
        .route("/events/stream", get(handlers::stream_events));

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let router = if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
