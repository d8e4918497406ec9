use crate::error::SplitError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runtime settings. Secrets live in their own file, see `secrets_path`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_gmail_api_base_url")]
    pub gmail_api_base_url: String,
    #[serde(default = "default_oauth_token_url")]
    pub oauth_token_url: String,
    #[serde(default = "default_venmo_api_base_url")]
    pub venmo_api_base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Resolve tenants but do not submit payment requests.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from("secrets.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_gmail_api_base_url() -> String {
    "https://gmail.googleapis.com/gmail/v1/users/me".to_string()
}

fn default_oauth_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_venmo_api_base_url() -> String {
    "https://api.venmo.com/v1".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info,utility_split=debug".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secrets_path: default_secrets_path(),
            token_path: default_token_path(),
            credentials_path: default_credentials_path(),
            gmail_api_base_url: default_gmail_api_base_url(),
            oauth_token_url: default_oauth_token_url(),
            venmo_api_base_url: default_venmo_api_base_url(),
            http_timeout_secs: default_http_timeout_secs(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Layers `.env`, an optional `utility-split.*` file and `UTILSPLIT__*`
    /// environment variables over the defaults.
    pub fn load() -> Result<Self, SplitError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("utility-split").required(false))
            .add_source(
                Environment::with_prefix("UTILSPLIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
