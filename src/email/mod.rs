//! Email dispatch of meeting summaries.
//!
//! Recipients are validated and de-duplicated, one HTML body is rendered,
//! then one message per recipient goes out through a [`MailTransport`].
//! All sends run concurrently; the first failure fails the dispatch.

mod smtp;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_SUBJECT: &str = "Meeting Summary";
pub const DEFAULT_SENDER_NAME: &str = "AI Meeting Notes Summarizer";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("No valid email addresses provided")]
    NoValidRecipients,

    #[error("email transport is not configured")]
    NotConfigured,

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    #[error("TLS failure: {0}")]
    TlsFailure(String),

    #[error("transport error: {0}")]
    Unknown(String),
}

impl EmailError {
    /// The underlying transport message.
    pub fn cause(&self) -> String {
        match self {
            Self::NoValidRecipients => self.to_string(),
            Self::NotConfigured => {
                "EMAIL_USER and EMAIL_APP_PASSWORD must both be set".to_string()
            }
            Self::AuthFailure(cause)
            | Self::ConnectionFailure(cause)
            | Self::TlsFailure(cause)
            | Self::Unknown(cause) => cause.clone(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoValidRecipients => "No valid email addresses provided",
            Self::NotConfigured => {
                "Email service is not configured. Please set the email account and app password."
            }
            Self::AuthFailure(_) => {
                "Email authentication failed. Please check your Gmail username and app password."
            }
            Self::ConnectionFailure(_) => {
                "Email connection failed. Please check your Gmail settings and app password."
            }
            Self::TlsFailure(_) => "SSL certificate issue. Please check your network configuration.",
            Self::Unknown(_) => "Failed to send email",
        }
    }
}

/// Classify a transport failure message when no structured code is available.
pub fn classify_transport_message(message: &str) -> EmailError {
    let cause = message.to_string();
    let lowered = message.to_lowercase();

    if lowered.contains("self-signed certificate") || lowered.contains("self signed certificate") {
        EmailError::TlsFailure(cause)
    } else if lowered.contains("authentication") || lowered.contains("invalid credentials") {
        EmailError::AuthFailure(cause)
    } else if lowered.contains("connection") || lowered.contains("connect") {
        EmailError::ConnectionFailure(cause)
    } else {
        EmailError::Unknown(cause)
    }
}

/// Simple shape check: non-whitespace local part, `@`, a domain containing a dot.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

/// Keep valid addresses, first occurrence wins, input order preserved.
pub fn filter_recipients<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    let mut accepted: Vec<String> = Vec::new();
    for candidate in candidates.iter().map(AsRef::as_ref) {
        if is_valid_email(candidate) && !accepted.iter().any(|a| a == candidate) {
            accepted.push(candidate.to_string());
        }
    }
    accepted
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the HTML envelope around a summary.
///
/// With `escape` off the summary is interpolated as-is, so any markup in it
/// reaches the recipient's mail client.
pub fn render_summary_html(summary: &str, sender_name: Option<&str>, escape: bool) -> String {
    let sender = sender_name
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SENDER_NAME);

    let (sender, summary) = if escape {
        (escape_html(sender), escape_html(summary))
    } else {
        (sender.to_string(), summary.to_string())
    };

    format!(
        r#"
      <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2 style="color: #333;">Meeting Summary</h2>
        <p><strong>From:</strong> {sender}</p>
        <hr style="border: 1px solid #eee; margin: 20px 0;">
        <div style="background-color: #f9f9f9; padding: 20px; border-radius: 5px;">
          {body}
        </div>
        <hr style="border: 1px solid #eee; margin: 20px 0;">
        <p style="color: #666; font-size: 12px;">
          This summary was generated using AI-powered meeting notes summarizer powered by Google Gemini.
        </p>
      </div>
    "#,
        sender = sender,
        body = summary.replace('\n', "<br>")
    )
}

/// One rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers a single message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), EmailError>;
}

/// A validated batch: at least one recipient, one subject, one body.
#[derive(Debug, Clone)]
pub struct EmailJob {
    recipients: Vec<String>,
    subject: String,
    body_html: String,
}

impl EmailJob {
    pub fn new<S: AsRef<str>>(
        candidates: &[S],
        subject: Option<&str>,
        body_html: String,
    ) -> Result<Self, EmailError> {
        let recipients = filter_recipients(candidates);
        if recipients.is_empty() {
            return Err(EmailError::NoValidRecipients);
        }

        let subject = subject
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT)
            .to_string();

        Ok(Self {
            recipients,
            subject,
            body_html,
        })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    fn messages(&self) -> impl Iterator<Item = OutgoingMessage> + '_ {
        self.recipients.iter().map(|to| OutgoingMessage {
            to: to.clone(),
            subject: self.subject.clone(),
            html_body: self.body_html.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    pub summary: String,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent_count: usize,
    pub accepted_recipients: Vec<String>,
}

pub struct Dispatcher {
    transport: Option<Arc<dyn MailTransport>>,
    escape_html: bool,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, escape_html: bool) -> Self {
        Self {
            transport: Some(transport),
            escape_html,
        }
    }

    /// A dispatcher with no transport: input is still validated, sending fails
    /// with [`EmailError::NotConfigured`].
    pub fn unconfigured(escape_html: bool) -> Self {
        Self {
            transport: None,
            escape_html,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReport, EmailError> {
        let body = render_summary_html(
            &request.summary,
            request.sender_name.as_deref(),
            self.escape_html,
        );
        let job = EmailJob::new(&request.recipients, request.subject.as_deref(), body)?;
        let transport = self.transport.as_ref().ok_or(EmailError::NotConfigured)?;

        info!(
            "Sending summary to {} recipient(s) ({} candidates)",
            job.recipients().len(),
            request.recipients.len()
        );

        let messages: Vec<OutgoingMessage> = job.messages().collect();
        let sends = messages.iter().map(|message| transport.send(message));

        if let Err(e) = try_join_all(sends).await {
            error!("Error sending email: {}", e);
            return Err(e);
        }

        info!(
            "Summary sent successfully to {} recipient(s)",
            job.recipients().len()
        );

        Ok(DispatchReport {
            sent_count: job.recipients().len(),
            accepted_recipients: job.recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMessage>>,
        fail_for: Option<(String, EmailError)>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), EmailError> {
            if let Some((address, err)) = &self.fail_for {
                if address == &message.to {
                    return Err(err.clone());
                }
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn request(recipients: &[&str], summary: &str) -> DispatchRequest {
        DispatchRequest {
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            summary: summary.to_string(),
            ..DispatchRequest::default()
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.co"));
    }

    #[test]
    fn test_filter_recipients_dedupes_in_order() {
        let accepted = filter_recipients(&["z@x.io", "bad", "a@b.co", "z@x.io", "a@b"]);
        assert_eq!(accepted, vec!["z@x.io".to_string(), "a@b.co".to_string()]);
    }

    #[test]
    fn test_job_requires_a_valid_recipient() {
        let result = EmailJob::new(&["bad", "a@b"], None, String::new());
        assert_eq!(result.unwrap_err(), EmailError::NoValidRecipients);
    }

    #[test]
    fn test_job_default_subject() {
        let job = EmailJob::new(&["a@b.co"], Some(""), String::new()).unwrap();
        assert_eq!(job.subject(), DEFAULT_SUBJECT);

        let job = EmailJob::new(&["a@b.co"], Some("Sprint 12"), String::new()).unwrap();
        assert_eq!(job.subject(), "Sprint 12");
    }

    #[test]
    fn test_render_converts_line_breaks_and_defaults_sender() {
        let html = render_summary_html("- A\n- B", None, true);
        assert!(html.contains("- A<br>- B"));
        assert!(html.contains("<strong>From:</strong> AI Meeting Notes Summarizer"));
    }

    #[test]
    fn test_render_escapes_summary_when_enabled() {
        let html = render_summary_html("<script>alert(1)</script> & co", Some("Ops <team>"), true);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(html.contains("Ops &lt;team&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_raw_when_escaping_disabled() {
        let html = render_summary_html("<b>bold</b>", Some("Dana"), false);
        assert!(html.contains("<b>bold</b>"));
        assert!(html.contains("<strong>From:</strong> Dana"));
    }

    #[test]
    fn test_classify_transport_message() {
        assert!(matches!(
            classify_transport_message("self-signed certificate in certificate chain"),
            EmailError::TlsFailure(_)
        ));
        assert!(matches!(
            classify_transport_message("permanent error (535): Authentication credentials invalid"),
            EmailError::AuthFailure(_)
        ));
        assert!(matches!(
            classify_transport_message("Connection error: Connection refused (os error 111)"),
            EmailError::ConnectionFailure(_)
        ));
        assert!(matches!(
            classify_transport_message("mailbox full"),
            EmailError::Unknown(_)
        ));
    }

    #[test]
    fn test_other_tls_errors_are_unclassified() {
        assert!(matches!(
            classify_transport_message("tls error: certificate has expired"),
            EmailError::Unknown(_)
        ));
        assert!(matches!(
            classify_transport_message("tls error: self signed certificate"),
            EmailError::TlsFailure(_)
        ));
    }

    #[tokio::test]
    async fn test_all_invalid_recipients_send_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(transport.clone(), true);

        let err = dispatcher
            .dispatch(request(&["bad", "a@b", ""], "x"))
            .await
            .unwrap_err();

        assert_eq!(err, EmailError::NoValidRecipients);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_sends_one_message_per_recipient() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(transport.clone(), true);

        let report = dispatcher
            .dispatch(DispatchRequest {
                recipients: vec![
                    "a@b.co".to_string(),
                    "oops".to_string(),
                    "c@d.io".to_string(),
                    "a@b.co".to_string(),
                ],
                subject: Some("Weekly sync".to_string()),
                summary: "Line 1\nLine 2".to_string(),
                sender_name: Some("Dana".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(report.sent_count, 2);
        assert_eq!(report.accepted_recipients, vec!["a@b.co", "c@d.io"]);

        let sent = transport.sent.lock().unwrap();
        let mut to: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
        to.sort();
        assert_eq!(to, vec!["a@b.co", "c@d.io"]);
        assert!(sent.iter().all(|m| m.subject == "Weekly sync"));
        assert!(sent.iter().all(|m| m.html_body.contains("Line 1<br>Line 2")));
    }

    #[tokio::test]
    async fn test_unconfigured_dispatcher_validates_first() {
        let dispatcher = Dispatcher::unconfigured(true);
        assert!(!dispatcher.is_configured());

        let err = dispatcher.dispatch(request(&["bad"], "x")).await.unwrap_err();
        assert_eq!(err, EmailError::NoValidRecipients);

        let err = dispatcher
            .dispatch(request(&["a@b.co"], "x"))
            .await
            .unwrap_err();
        assert_eq!(err, EmailError::NotConfigured);
    }

    #[tokio::test]
    async fn test_single_failure_fails_dispatch() {
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail_for: Some((
                "c@d.io".to_string(),
                EmailError::AuthFailure("535 5.7.8 Username and Password not accepted".to_string()),
            )),
        });
        let dispatcher = Dispatcher::new(transport, true);

        let err = dispatcher
            .dispatch(request(&["a@b.co", "c@d.io"], "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmailError::AuthFailure(_)));
        assert_eq!(
            err.user_message(),
            "Email authentication failed. Please check your Gmail username and app password."
        );
        assert!(err.cause().contains("535"));
    }
}
