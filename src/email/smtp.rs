use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::{classify_transport_message, EmailError, MailTransport, OutgoingMessage};
use crate::config::EmailConfig;
use crate::error_chain;

/// SMTP reply codes that mean the server rejected our credentials.
const AUTH_REJECTION_CODES: [&str; 3] = ["530", "534", "535"];

/// SMTP relay authenticated with a fixed account and app password.
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Port 465 uses implicit TLS, any other port STARTTLS.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let user = config
            .user
            .clone()
            .filter(|u| !u.is_empty())
            .context("email user is required for SMTP delivery")?;
        let password = config
            .app_password
            .clone()
            .filter(|p| !p.is_empty())
            .context("email app password is required for SMTP delivery")?;

        let from: Mailbox = user
            .parse()
            .with_context(|| format!("Invalid email account address: {}", user))?;

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .context("Failed to configure SMTP transport")?;

        let mailer = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(user, password))
            .build();

        info!(
            "Email service initialized (SMTP {}:{})",
            config.smtp_host, config.smtp_port
        );

        Ok(Self { mailer, from })
    }
}

/// Map an SMTP failure onto the error taxonomy.
///
/// TLS errors other than a self-signed certificate stay unclassified.
fn classify_transport_error(err: &lettre::transport::smtp::Error) -> EmailError {
    let cause = error_chain(err);

    if let Some(code) = err.status() {
        if AUTH_REJECTION_CODES.contains(&code.to_string().as_str()) {
            return EmailError::AuthFailure(cause);
        }
    }

    if err.is_timeout() {
        return EmailError::ConnectionFailure(cause);
    }

    classify_transport_message(&cause)
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), EmailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| EmailError::Unknown(format!("Invalid recipient {}: {}", message.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| EmailError::Unknown(e.to_string()))?;

        debug!("Sending email to {}", message.to);

        self.mailer
            .send(email)
            .await
            .map_err(|e| classify_transport_error(&e))?;

        debug!("Email delivered to {}", message.to);
        Ok(())
    }
}
