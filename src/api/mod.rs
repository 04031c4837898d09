//! REST API server for the meeting notes summarizer.
//!
//! Provides HTTP endpoints for:
//! - Service health
//! - Summarizing a pasted transcript or an uploaded document
//! - Emailing a finished summary

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::email::Dispatcher;
use crate::summarize::Summarizer;
use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, response::IntoResponse, response::Response, Router};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use error::ApiError;

/// Shared, read-only handles every route works with.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub dispatcher: Arc<Dispatcher>,
    pub gemini_configured: bool,
    /// Largest accepted upload, in bytes.
    pub max_file_size: usize,
}

/// Build the full application router.
pub fn router(state: AppState, json_body_limit: usize) -> Router {
    Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::summarize::router(state.clone()))
        .merge(routes::email::router(state))
        .layer(DefaultBodyLimit::max(json_body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::from_panic(payload).into_response()
}

pub struct ApiServer {
    host: String,
    port: u16,
    json_body_limit: usize,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            json_body_limit: config.server.json_body_limit,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let email_configured = self.state.dispatcher.is_configured();
        let gemini_configured = self.state.gemini_configured;
        let app = router(self.state, self.json_body_limit);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!(
            "AI Meeting Notes Summarizer Backend running on http://{}",
            addr
        );
        info!(
            "Email service: {}",
            if email_configured { "Configured" } else { "Not configured" }
        );
        info!(
            "Gemini AI: {}",
            if gemini_configured { "Configured" } else { "Not configured" }
        );
        info!("Endpoints:");
        info!("  GET  /health                - Service health");
        info!("  POST /api/summarize         - Summarize a transcript");
        info!("  POST /api/summarize-upload  - Summarize an uploaded document");
        info!("  POST /api/send-email        - Email a summary");

        axum::serve(listener, app).await?;

        Ok(())
    }
}
