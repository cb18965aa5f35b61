//! Runtime configuration: defaults, then an optional TOML file, then
//! `HUDUMA_*` environment variables.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the managed backend, e.g. `https://xyz.example.co`.
    pub api_url: String,
    /// Public API key sent as the `apikey` header on every request.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gateway_path")]
    pub gateway_path: String,
    #[serde(default = "default_transactions_table")]
    pub transactions_table: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    /// Display label appended to amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_gateway_path() -> String {
    "/functions/v1/process-payment".to_string()
}

fn default_transactions_table() -> String {
    "transactions".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".huduma/session.json")
}

fn default_currency() -> String {
    "TZS".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration, reading `.env` first if one is present.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = ::config::Config::builder()
            .add_source(::config::File::with_name("huduma").required(false));
        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::with_name(path).required(true));
        }
        builder = builder.add_source(::config::Environment::with_prefix("HUDUMA").try_parsing(true));

        let cfg: Config = builder
            .build()
            .context("loading configuration")?
            .try_deserialize()
            .context("HUDUMA_API_URL (or api_url in the config file) must be set")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration pointing at `api_url` with every other key defaulted.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: String::new(),
            gateway_path: default_gateway_path(),
            transactions_table: default_transactions_table(),
            request_timeout_secs: default_request_timeout_secs(),
            session_path: default_session_path(),
            currency: default_currency(),
            log_level: default_log_level(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("api_url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// The `apikey` header value, if one is configured.
    pub fn api_key(&self) -> Option<String> {
        Some(self.api_key.trim().to_string()).filter(|k| !k.is_empty())
    }

    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client; every request inherits the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .user_agent(concat!("huduma-wallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")
    }
}
