//! HTTP front door: one JSON endpoint in front of the chat router.

use crate::ai::{GeminiClient, GenerationService};
use crate::models::{ChatRequest, ChatResponse, Config};
use crate::router::ChatRouter;
use crate::{Error, Result};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Errors that escape the router become a generic 500; the cause is only logged.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Unhandled error in chat endpoint: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatResponse::new(INTERNAL_ERROR_MESSAGE)),
        )
            .into_response()
    }
}

/// Owns the routing state and builds the axum service around it.
pub struct App {
    chat: Arc<ChatRouter>,
    max_body_bytes: usize,
}

impl App {
    /// Build an app around any generation backend.
    ///
    /// This is primarily useful for integration tests that need to inject mocks.
    pub fn with_services(generation: Arc<dyn GenerationService>, max_body_bytes: usize) -> Self {
        Self {
            chat: Arc::new(ChatRouter::new(generation)),
            max_body_bytes,
        }
    }

    /// Construct an app backed by the Gemini API.
    pub fn new(config: &Config) -> Self {
        let gemini = GeminiClient::new(config);
        info!("Chat provider: Gemini (model: {})", gemini.model());
        Self::with_services(Arc::new(gemini), config.max_body_bytes)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/chat", post(chat))
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.chat.clone())
    }

    /// Bind and serve until Ctrl-C.
    pub async fn run(&self, host: &str, port: u16) -> Result<()> {
        let listener = tokio::net::TcpListener::bind((host, port)).await?;
        info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn chat(
    State(chat): State<Arc<ChatRouter>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let response = chat
        .route(&request.message, request.image_data.as_deref())
        .await?;
    Ok(Json(ChatResponse::new(response)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
