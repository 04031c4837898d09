//! Summarization client: one time-bounded call to a generative-text provider.
//!
//! The provider sits behind [`TextGenerator`] so the HTTP layer and tests can
//! swap in another implementation. [`Summarizer`] owns the timeout and the
//! mapping of raw provider failures onto [`SummaryError`].

mod gemini;

pub use gemini::GeminiClient;

use crate::prompt::{self, ComposedPrompt};
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Failure kinds of a summarization call. Each carries the raw provider message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("provider error: {0}")]
    Unknown(String),
}

impl SummaryError {
    /// The original provider or transport message.
    pub fn cause(&self) -> &str {
        match self {
            Self::InvalidCredentials(cause)
            | Self::QuotaExceeded(cause)
            | Self::ModelUnavailable(cause)
            | Self::NetworkFailure(cause)
            | Self::Timeout(cause)
            | Self::Unknown(cause) => cause,
        }
    }

    /// Human-readable message for API clients, or `None` for unclassified failures.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::InvalidCredentials(_) => {
                Some("Invalid Gemini API key. Please check your API key configuration.")
            }
            Self::QuotaExceeded(_) => {
                Some("API quota exceeded. Please check your Gemini API usage limits.")
            }
            Self::ModelUnavailable(_) => {
                Some("Gemini model not found. Please check the model configuration.")
            }
            Self::NetworkFailure(_) => Some(
                "Network connection failed. Please check your internet connection and firewall settings.",
            ),
            Self::Timeout(_) => {
                Some("Request timed out. Please try again or check your network connection.")
            }
            Self::Unknown(_) => None,
        }
    }
}

/// Classify a raw provider message by the markers it contains.
///
/// Used when no structured status is available. Rules are checked in order
/// and are case-sensitive.
pub fn classify_provider_message(message: &str) -> SummaryError {
    let cause = message.to_string();

    if message.contains("API_KEY_INVALID") {
        SummaryError::InvalidCredentials(cause)
    } else if message.contains("QUOTA_EXCEEDED") {
        SummaryError::QuotaExceeded(cause)
    } else if message.contains("MODEL_NOT_FOUND") {
        SummaryError::ModelUnavailable(cause)
    } else if message.contains("fetch failed") || message.contains("network") {
        SummaryError::NetworkFailure(cause)
    } else if message.contains("timeout") {
        SummaryError::Timeout(cause)
    } else {
        SummaryError::Unknown(cause)
    }
}

/// Structured error returned by the provider's REST API.
#[derive(Debug, Clone, Default)]
pub struct ProviderStatus {
    pub http_status: u16,
    /// Canonical status name, e.g. `RESOURCE_EXHAUSTED`.
    pub status: Option<String>,
    /// `reason` values from the error details, e.g. `API_KEY_INVALID`.
    pub reasons: Vec<String>,
    pub message: String,
}

impl ProviderStatus {
    fn describe(&self) -> String {
        let mut out = format!("[{}", self.http_status);
        if let Some(status) = &self.status {
            out.push(' ');
            out.push_str(status);
        }
        out.push_str("] ");
        out.push_str(&self.message);
        if !self.reasons.is_empty() {
            out.push_str(&format!(" ({})", self.reasons.join(", ")));
        }
        out
    }
}

/// Map a structured provider status onto the error taxonomy, falling back to
/// message markers when the status is not one we recognize.
pub fn classify_api_status(status: &ProviderStatus) -> SummaryError {
    let cause = status.describe();
    let has_reason = |reason: &str| status.reasons.iter().any(|r| r == reason);

    if has_reason("API_KEY_INVALID") {
        return SummaryError::InvalidCredentials(cause);
    }

    match (status.status.as_deref(), status.http_status) {
        (Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED"), _) | (_, 401) => {
            SummaryError::InvalidCredentials(cause)
        }
        (Some("RESOURCE_EXHAUSTED"), _) | (_, 429) => SummaryError::QuotaExceeded(cause),
        (Some("NOT_FOUND"), _) | (_, 404) => SummaryError::ModelUnavailable(cause),
        (Some("DEADLINE_EXCEEDED"), _) | (_, 504) => SummaryError::Timeout(cause),
        _ => classify_provider_message(&cause),
    }
}

/// A generative-text provider that turns ordered prompt parts into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, parts: &[&str]) -> Result<String, SummaryError>;
}

/// Validated input for one summarization.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    transcript: Transcript,
    instruction: String,
}

impl SummaryRequest {
    /// Returns `None` when either the transcript or the instruction is empty.
    pub fn new(transcript: Transcript, instruction: impl Into<String>) -> Option<Self> {
        let instruction = instruction.into();
        if transcript.is_empty() || instruction.is_empty() {
            return None;
        }
        Some(Self {
            transcript,
            instruction,
        })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub text: String,
    pub source_transcript: Transcript,
    pub instruction: String,
}

/// Runs summarizations against a provider with a hard wall-clock ceiling.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Compose prompts for the request and return the generated summary.
    pub async fn run(&self, request: SummaryRequest) -> Result<SummaryResult, SummaryError> {
        info!(
            "Generating summary with {}: transcript {} characters",
            self.provider_name(),
            request.transcript.char_count()
        );
        info!("Custom prompt: {}", request.instruction);

        let prompt = prompt::compose(&request.transcript, &request.instruction);
        let text = self.summarize(&prompt).await?;

        Ok(SummaryResult {
            text,
            source_transcript: request.transcript,
            instruction: request.instruction,
        })
    }

    /// Issue exactly one provider call. The call is dropped, and so cancelled,
    /// once the timeout elapses.
    pub async fn summarize(&self, prompt: &ComposedPrompt) -> Result<String, SummaryError> {
        debug!(
            "Calling {} with system prompt {} chars, user prompt {} chars",
            self.provider_name(),
            prompt.system.len(),
            prompt.user.len()
        );

        let parts = prompt.parts();
        let outcome = tokio::time::timeout(self.timeout, self.generator.generate(&parts)).await;

        match outcome {
            Ok(Ok(text)) => {
                info!(
                    "Summary generated successfully, length: {} characters",
                    text.chars().count()
                );
                Ok(text)
            }
            Ok(Err(e)) => {
                error!("Error generating summary: {}", e);
                Err(e)
            }
            Err(_) => {
                let e = SummaryError::Timeout(format!(
                    "request aborted after {} ms",
                    self.timeout.as_millis()
                ));
                error!("Error generating summary: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedGenerator {
        reply: Result<String, SummaryError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FixedGenerator {
        fn new(reply: Result<String, SummaryError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(&self, parts: &[&str]) -> Result<String, SummaryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut seen = self.seen.lock().unwrap();
            seen.extend(parts.iter().map(|p| p.to_string()));
            self.reply.clone()
        }
    }

    struct SlowGenerator {
        delay: Duration,
    }

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self, _parts: &[&str]) -> Result<String, SummaryError> {
            tokio::time::sleep(self.delay).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_classify_provider_message_markers() {
        let cases = [
            ("[400] API key not valid. API_KEY_INVALID", "InvalidCredentials"),
            ("429 QUOTA_EXCEEDED for project", "QuotaExceeded"),
            ("MODEL_NOT_FOUND: gemini-9", "ModelUnavailable"),
            ("TypeError: fetch failed", "NetworkFailure"),
            ("a network error occurred", "NetworkFailure"),
            ("socket timeout while reading", "Timeout"),
            ("something odd happened", "Unknown"),
        ];

        for (message, expected) in cases {
            let err = classify_provider_message(message);
            let kind = format!("{:?}", err);
            assert!(kind.starts_with(expected), "{} -> {}", message, kind);
            assert_eq!(err.cause(), message);
        }
    }

    #[test]
    fn test_classify_prefers_earlier_rules() {
        let err = classify_provider_message("API_KEY_INVALID after network timeout");
        assert!(matches!(err, SummaryError::InvalidCredentials(_)));
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert!(matches!(
            classify_provider_message("Network unreachable"),
            SummaryError::Unknown(_)
        ));
    }

    #[test]
    fn test_quota_exceeded_preserves_cause() {
        let message = "[429 Too Many Requests] QUOTA_EXCEEDED: requests per minute";
        let err = classify_provider_message(message);
        assert_eq!(err, SummaryError::QuotaExceeded(message.to_string()));
        assert_eq!(
            err.user_message(),
            Some("API quota exceeded. Please check your Gemini API usage limits.")
        );
    }

    #[test]
    fn test_classify_api_status_uses_reason() {
        let status = ProviderStatus {
            http_status: 400,
            status: Some("INVALID_ARGUMENT".to_string()),
            reasons: vec!["API_KEY_INVALID".to_string()],
            message: "API key not valid. Please pass a valid API key.".to_string(),
        };
        let err = classify_api_status(&status);
        assert!(matches!(err, SummaryError::InvalidCredentials(_)));
        assert!(err.cause().contains("API key not valid"));
        assert!(err.cause().contains("API_KEY_INVALID"));
    }

    #[test]
    fn test_classify_api_status_codes() {
        let status = |http_status: u16, name: Option<&str>| ProviderStatus {
            http_status,
            status: name.map(String::from),
            reasons: Vec::new(),
            message: "details".to_string(),
        };

        assert!(matches!(
            classify_api_status(&status(429, Some("RESOURCE_EXHAUSTED"))),
            SummaryError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify_api_status(&status(404, None)),
            SummaryError::ModelUnavailable(_)
        ));
        assert!(matches!(
            classify_api_status(&status(403, Some("PERMISSION_DENIED"))),
            SummaryError::InvalidCredentials(_)
        ));
        assert!(matches!(
            classify_api_status(&status(504, Some("DEADLINE_EXCEEDED"))),
            SummaryError::Timeout(_)
        ));
        assert!(matches!(
            classify_api_status(&status(500, Some("INTERNAL"))),
            SummaryError::Unknown(_)
        ));
    }

    #[test]
    fn test_unknown_has_no_user_message() {
        assert!(SummaryError::Unknown("x".to_string()).user_message().is_none());
    }

    #[test]
    fn test_summary_request_requires_both_fields() {
        assert!(SummaryRequest::new(Transcript::new(""), "bullets").is_none());
        assert!(SummaryRequest::new(Transcript::new("text"), "").is_none());
        assert!(SummaryRequest::new(Transcript::new("text"), "bullets").is_some());
    }

    #[tokio::test]
    async fn test_run_returns_provider_text_unmodified() {
        let generator = Arc::new(FixedGenerator::new(Ok("- A\n- B\n- C".to_string())));
        let summarizer = Summarizer::new(generator.clone(), Duration::from_secs(30));

        let request =
            SummaryRequest::new(Transcript::new("We discussed Q3 budget."), "Summarize in 3 bullets")
                .unwrap();
        let result = summarizer.run(request).await.unwrap();

        assert_eq!(result.text, "- A\n- B\n- C");
        assert_eq!(result.source_transcript.as_str(), "We discussed Q3 budget.");
        assert_eq!(result.instruction, "Summarize in 3 bullets");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], prompt::SYSTEM_PROMPT);
        assert!(seen[1].contains("We discussed Q3 budget."));
    }

    #[tokio::test]
    async fn test_provider_error_is_not_retried() {
        let generator = Arc::new(FixedGenerator::new(Err(SummaryError::QuotaExceeded(
            "QUOTA_EXCEEDED".to_string(),
        ))));
        let summarizer = Summarizer::new(generator.clone(), Duration::from_secs(30));
        let request = SummaryRequest::new(Transcript::new("t"), "p").unwrap();

        let err = summarizer.run(request).await.unwrap_err();
        assert!(matches!(err, SummaryError::QuotaExceeded(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let summarizer = Summarizer::new(
            Arc::new(SlowGenerator {
                delay: Duration::from_secs(5),
            }),
            Duration::from_millis(50),
        );
        let request = SummaryRequest::new(Transcript::new("t"), "p").unwrap();

        let started = std::time::Instant::now();
        let err = summarizer.run(request).await.unwrap_err();

        assert!(matches!(err, SummaryError::Timeout(_)));
        assert!(err.cause().contains("50 ms"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
