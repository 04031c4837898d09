//! Email endpoint (POST /api/send-email).

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::email::DispatchRequest;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub recipients: Option<Vec<String>>,
    pub subject: Option<String>,
    pub summary: Option<String>,
    pub sender_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub recipients: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/send-email", post(send_email))
        .with_state(state)
}

/// Send the summary to every valid recipient.
///
/// An empty recipient list is present but has no valid address, so it
/// answers "No valid email addresses provided" rather than "required".
async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> ApiResult<Json<SendEmailResponse>> {
    let Json(payload) = payload.inspect_err(|e| error!("Rejected send-email body: {}", e))?;

    let (Some(recipients), Some(summary)) = (
        payload.recipients,
        payload.summary.filter(|summary| !summary.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Recipients and summary are required"));
    };

    let report = state
        .dispatcher
        .dispatch(DispatchRequest {
            recipients,
            subject: payload.subject,
            summary,
            sender_name: payload.sender_name,
        })
        .await
        .inspect_err(|e| error!("Send-email request failed: {}", e))?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: format!(
            "Summary sent successfully to {} recipient(s)",
            report.sent_count
        ),
        recipients: report.accepted_recipients,
    }))
}
