//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create the copilot router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Chat endpoints; `/score` is the managed-endpoint scoring path
        .route("/score", post(handlers::chat))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
}
