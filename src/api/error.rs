//! API error handling for consistent JSON error responses.
//!
//! Every failure leaves a handler as `{"error": ...}` or
//! `{"error": ..., "details": ...}` with the matching status code.

use crate::email::EmailError;
use crate::extract::ExtractError;
use crate::summarize::SummaryError;
use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::any::Any;
use tracing::error;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const UNSUPPORTED_UPLOAD_MESSAGE: &str = "Only text, PDF, and Word documents are allowed";

/// API error type that converts to JSON responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a summarization failure. Unclassified failures use `fallback` as the message.
    pub fn from_summary(err: SummaryError, fallback: &str) -> Self {
        let message = err.user_message().unwrap_or(fallback);
        Self::internal(message).with_details(err.cause())
    }

    /// Map a panic payload caught by the catch-all layer.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let details = if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = payload.downcast_ref::<&str>() {
            message.to_string()
        } else {
            "unknown panic".to_string()
        };

        error!("Unhandled error: {}", details);
        Self::internal(INTERNAL_ERROR_MESSAGE).with_details(details)
    }

    fn body(&self) -> Value {
        match &self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::NoValidRecipients => Self::bad_request(err.user_message()),
            _ => Self::internal(err.user_message()).with_details(err.cause()),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let details = err.to_string();
        match err {
            ExtractError::UnsupportedFormat(_) => {
                Self::bad_request(UNSUPPORTED_UPLOAD_MESSAGE).with_details(details)
            }
            ExtractError::TooLarge { .. } => {
                Self::internal(INTERNAL_ERROR_MESSAGE).with_details(details)
            }
            ExtractError::Failed(_) => {
                Self::internal("Failed to process uploaded file").with_details(details)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let details = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::internal(INTERNAL_ERROR_MESSAGE).with_details(details);
        }
        Self::bad_request("Invalid JSON request body").with_details(details)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let details = err.body_text();
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::internal(INTERNAL_ERROR_MESSAGE)
                .with_details(format!("File too large: {}", details));
        }
        Self::bad_request("Invalid multipart upload").with_details(details)
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
