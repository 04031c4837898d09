//! Health endpoint (GET /health).

use crate::api::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

pub const HEALTH_MESSAGE: &str = "AI Meeting Notes Summarizer Backend is running";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub gemini_configured: bool,
    pub email_configured: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// Always 200; reports which integrations have credentials.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: HEALTH_MESSAGE,
        gemini_configured: state.gemini_configured,
        email_configured: state.dispatcher.is_configured(),
    })
}
