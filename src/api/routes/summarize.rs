//! Summarization endpoints.
//!
//! Provides HTTP endpoints for:
//! - Summarizing a pasted transcript (POST /api/summarize)
//! - Summarizing an uploaded document (POST /api/summarize-upload)

use crate::api::error::{ApiError, ApiResult, INTERNAL_ERROR_MESSAGE};
use crate::api::AppState;
use crate::extract::{self, UploadedFile};
use crate::summarize::{SummaryRequest, SummaryResult};
use crate::transcript::Transcript;
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Room for multipart boundaries and the text fields around the file part.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const FILE_FIELD: &str = "file";
const CUSTOM_PROMPT_FIELD: &str = "customPrompt";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub transcript: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: String,
    pub original_transcript: String,
    pub custom_prompt: String,
}

impl From<SummaryResult> for SummaryResponse {
    fn from(result: SummaryResult) -> Self {
        Self {
            success: true,
            summary: result.text,
            original_transcript: result.source_transcript.into_string(),
            custom_prompt: result.instruction,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let upload_limit = state.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/api/summarize", post(summarize_text))
        .route(
            "/api/summarize-upload",
            post(summarize_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

/// Summarize a transcript sent as JSON `{transcript, customPrompt}`.
async fn summarize_text(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Json<SummaryResponse>> {
    let Json(payload) = payload.inspect_err(|e| error!("Rejected summarize body: {}", e))?;

    let request = SummaryRequest::new(
        Transcript::new(payload.transcript.unwrap_or_default()),
        payload.custom_prompt.unwrap_or_default(),
    )
    .ok_or_else(|| ApiError::bad_request("Transcript and custom prompt are required"))?;

    let result = state.summarizer.run(request).await.map_err(|e| {
        error!("Error generating summary: {}", e);
        ApiError::from_summary(e, "Failed to generate summary")
    })?;

    Ok(Json(result.into()))
}

/// Summarize a document sent as multipart fields `file` and `customPrompt`.
async fn summarize_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<SummaryResponse>> {
    // A body that is not multipart carries no file
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file uploaded"))?;

    let mut upload: Option<UploadedFile> = None;
    let mut custom_prompt: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some(FILE_FIELD) => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;

                info!(
                    "File: {} Size: {} bytes ({})",
                    original_name,
                    bytes.len(),
                    mime_type
                );

                let file = UploadedFile::new(
                    bytes.to_vec(),
                    mime_type,
                    original_name,
                    state.max_file_size,
                )
                .inspect_err(|e| error!("Rejected upload: {}", e))?;
                upload = Some(file);
            }
            Some(CUSTOM_PROMPT_FIELD) => custom_prompt = Some(field.text().await?),
            _ => {}
        }
    }

    let file = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let custom_prompt = custom_prompt
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| ApiError::bad_request("Custom prompt is required"))?;

    let transcript = tokio::task::spawn_blocking(move || extract::extract(&file))
        .await
        .map_err(|e| {
            error!("Extraction task failed: {}", e);
            ApiError::internal(INTERNAL_ERROR_MESSAGE).with_details(e.to_string())
        })??;

    let request = SummaryRequest::new(transcript, custom_prompt)
        .ok_or_else(|| ApiError::bad_request("Uploaded file contains no text"))?;

    let result = state.summarizer.run(request).await.map_err(|e| {
        error!("Error processing file upload: {}", e);
        ApiError::from_summary(e, "Failed to process uploaded file")
    })?;

    Ok(Json(result.into()))
}
