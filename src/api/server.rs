//! HTTP server implementation

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::AllowHeaders;
use tower_http::cors::AllowMethods;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::RagService;
use crate::Result;

/// CORS for the configured origins.
///
/// With explicit origins, credentials are allowed and methods/headers are
/// mirrored from the preflight. An empty list allows any origin without
/// credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Router with tracing and CORS layers applied
pub fn build_router(rag_service: Arc<RagService>, cors_origins: &[String]) -> Router {
    let state = AppState { rag_service };

    routes::api_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(cors_origins)),
    )
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, rag_service: Arc<RagService>) -> Result<()> {
    info!("🚀 Starting portfolio chat API server...");

    let app = build_router(rag_service, &config.server.cors_origins);

    if config.server.cors_origins.is_empty() {
        info!("✅ CORS enabled for any origin");
    } else {
        info!("✅ CORS enabled for: {}", config.server.cors_origins.join(", "));
    }

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /      - Health check");
    info!("  POST /chat  - Ask the portfolio assistant");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
