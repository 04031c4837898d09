use crate::api::{AppState, ApiServer};
use crate::config::Config;
use crate::email::{Dispatcher, SmtpMailer};
use crate::summarize::{GeminiClient, Summarizer};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Validate configuration, build every component once, then serve until shutdown.
pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting AI Meeting Notes Summarizer Backend");

    config.validate_for_serving()?;

    let state = build_state(&config)?;
    ApiServer::new(&config, state).start().await
}

/// Construct the shared handles from configuration.
///
/// The Gemini key is required. Email is optional: without usable
/// credentials the dispatcher still validates input but refuses to send.
pub fn build_state(config: &Config) -> Result<AppState> {
    let gemini = GeminiClient::new(&config.gemini)?;
    info!("Gemini AI initialized with model {}", gemini.model());
    let summarizer = Summarizer::new(Arc::new(gemini), config.gemini.timeout());

    Ok(AppState {
        summarizer: Arc::new(summarizer),
        dispatcher: Arc::new(build_dispatcher(config)),
        gemini_configured: config.gemini.is_configured(),
        max_file_size: config.upload.max_file_size,
    })
}

fn build_dispatcher(config: &Config) -> Dispatcher {
    let escape_html = config.email.escape_html;

    if !config.email.is_configured() {
        return Dispatcher::unconfigured(escape_html);
    }

    match SmtpMailer::from_config(&config.email) {
        Ok(mailer) => Dispatcher::new(Arc::new(mailer), escape_html),
        Err(e) => {
            warn!("Email service unavailable: {:#}", e);
            Dispatcher::unconfigured(escape_html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini_only() -> Config {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_build_state_requires_gemini_key() {
        assert!(build_state(&Config::default()).is_err());
    }

    #[test]
    fn test_build_state_without_email() {
        let state = build_state(&gemini_only()).unwrap();
        assert!(state.gemini_configured);
        assert!(!state.dispatcher.is_configured());
        assert_eq!(state.summarizer.provider_name(), "Gemini API");
    }

    #[test]
    fn test_invalid_email_account_degrades_to_unconfigured() {
        let mut config = gemini_only();
        config.email.user = Some("not an address".to_string());
        config.email.app_password = Some("secret".to_string());

        let state = build_state(&config).unwrap();
        assert!(!state.dispatcher.is_configured());
    }

    #[tokio::test]
    async fn test_build_state_with_email() {
        let mut config = gemini_only();
        config.email.user = Some("notes@example.com".to_string());
        config.email.app_password = Some("abcd efgh ijkl mnop".to_string());

        let state = build_state(&config).unwrap();
        assert!(state.dispatcher.is_configured());
    }
}
