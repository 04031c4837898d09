use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{
    classify_api_status, classify_provider_message, ProviderStatus, SummaryError, TextGenerator,
};
use crate::config::GeminiConfig;
use crate::error_chain;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    reason: Option<String>,
}

/// Header carrying the API key, so it never appears in request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` over REST.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .context("api_key is required for the Gemini provider")?;

        let client = reqwest::Client::new();
        let endpoint = config.endpoint.trim_end_matches('/').to_string();

        info!(
            "Initialized Gemini client with endpoint: {} (model {})",
            endpoint, config.model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }

    /// Unauthenticated GET on the models listing, used to probe reachability.
    pub async fn probe(
        &self,
        timeout: std::time::Duration,
    ) -> Result<reqwest::StatusCode, SummaryError> {
        let url = format!("{}/models", self.endpoint);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_request_error)?;
        Ok(response.status())
    }
}

/// Map a reqwest failure (no HTTP response) onto the error taxonomy.
///
/// The request URL is stripped from the cause, which is returned to API clients.
fn classify_request_error(err: reqwest::Error) -> SummaryError {
    let err = err.without_url();
    let cause = error_chain(&err);
    if err.is_timeout() {
        SummaryError::Timeout(cause)
    } else if err.is_connect() || err.is_request() {
        SummaryError::NetworkFailure(cause)
    } else {
        classify_provider_message(&cause)
    }
}

fn status_from_body(http_status: reqwest::StatusCode, body: &str) -> ProviderStatus {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => ProviderStatus {
            http_status: http_status.as_u16(),
            status: parsed.error.status,
            reasons: parsed
                .error
                .details
                .into_iter()
                .filter_map(|d| d.reason)
                .collect(),
            message: parsed.error.message,
        },
        Err(_) => ProviderStatus {
            http_status: http_status.as_u16(),
            status: http_status.canonical_reason().map(str::to_string),
            reasons: Vec::new(),
            message: body.to_string(),
        },
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, SummaryError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(SummaryError::Unknown(format!(
            "Text not available. Response was blocked or empty: {}",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(SummaryError::Unknown(format!(
            "Text not available. Candidate finished with reason {}",
            candidate.finish_reason.as_deref().unwrap_or("UNKNOWN")
        )));
    }

    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "Gemini API"
    }

    async fn generate(&self, parts: &[&str]) -> Result<String, SummaryError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: parts.iter().map(|text| Part { text: *text }).collect(),
            }],
        };

        debug!("Calling Gemini generateContent with model {}", self.model);

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(classify_request_error)?;

        if !status.is_success() {
            error!(
                "Gemini request failed with status {}: {}",
                status, response_body
            );
            return Err(classify_api_status(&status_from_body(status, &response_body)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_body)
            .map_err(|e| SummaryError::Unknown(format!("Failed to parse Gemini response: {}", e)))?;

        response_text(parsed)
    }
}
