//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create the chat API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/", get(handlers::health))
        // RAG chat
        .route("/chat", post(handlers::chat))
        .with_state(state)
}
