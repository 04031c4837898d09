use crate::global;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variables that override values read from the config file.
pub mod env_keys {
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
    pub const GEMINI_ENDPOINT: &str = "GEMINI_ENDPOINT";
    pub const EMAIL_USER: &str = "EMAIL_USER";
    pub const EMAIL_APP_PASSWORD: &str = "EMAIL_APP_PASSWORD";
    pub const SMTP_HOST: &str = "SMTP_HOST";
    pub const SMTP_PORT: &str = "SMTP_PORT";
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
}

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub email: EmailConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted JSON request body, in bytes.
    pub json_body_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Hard ceiling for one generation call, in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Account used both to authenticate and as the From address.
    pub user: Option<String>,
    pub app_password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// HTML-escape the summary before placing it in the email body.
    pub escape_html: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            json_body_limit: 10 * MIB,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            user: None,
            app_password: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            escape_html: true,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * MIB,
        }
    }
}

impl GeminiConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.user) && present(&self.app_password)
    }
}

impl Config {
    /// Load `.env`, the config file (if any) and environment overrides, in that order.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {:?}", path);
        }

        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get(env_keys::GEMINI_API_KEY) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get(env_keys::GEMINI_MODEL) {
            self.gemini.model = model;
        }
        if let Some(endpoint) = get(env_keys::GEMINI_ENDPOINT) {
            self.gemini.endpoint = endpoint;
        }
        if let Some(user) = get(env_keys::EMAIL_USER) {
            self.email.user = Some(user);
        }
        if let Some(password) = get(env_keys::EMAIL_APP_PASSWORD) {
            self.email.app_password = Some(password);
        }
        if let Some(host) = get(env_keys::SMTP_HOST) {
            self.email.smtp_host = host;
        }
        if let Some(port) = get(env_keys::SMTP_PORT) {
            self.email.smtp_port = port
                .parse()
                .with_context(|| format!("Invalid {}: {}", env_keys::SMTP_PORT, port))?;
        }
        if let Some(host) = get(env_keys::HOST) {
            self.server.host = host;
        }
        if let Some(port) = get(env_keys::PORT) {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid {}: {}", env_keys::PORT, port))?;
        }

        Ok(())
    }

    /// Startup checks: a missing Gemini key is fatal, missing email credentials only warn.
    pub fn validate_for_serving(&self) -> Result<()> {
        if !self.gemini.is_configured() {
            bail!(
                "{} is not set. Set it in your environment, a .env file or {:?}",
                env_keys::GEMINI_API_KEY,
                Self::config_path().unwrap_or_default()
            );
        }

        if !self.email.is_configured() {
            warn!("Email credentials not fully configured");
            warn!("Email functionality may not work properly");
        }

        Ok(())
    }

    /// Copy of the config with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "********".to_string());
        let mut copy = self.clone();
        copy.gemini.api_key = mask(&self.gemini.api_key);
        copy.email.app_password = mask(&self.email.app_password);
        copy
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
