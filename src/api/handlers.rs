/// API request handlers
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::ChatRequest;
use crate::api::types::ChatResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::errors::PortfolioChatError;
use crate::rag::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag_service: Arc<RagService>,
}

/// Error returned to HTTP clients as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<PortfolioChatError> for ApiError {
    fn from(err: PortfolioChatError) -> Self {
        match err {
            PortfolioChatError::InvalidInput(detail) => Self::bad_request(detail),
            other => Self::internal(format!("Error generating response: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Chat (POST /chat)
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }

    info!("POST /chat: {}", req.message);

    match state.rag_service.answer(&req.message).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            error!("Error processing chat message: {}", e);
            Err(e.into())
        }
    }
}
