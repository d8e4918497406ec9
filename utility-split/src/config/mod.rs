use anyhow::anyhow;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use split_core::config::Settings;
use split_core::error::{SplitError, SplitResult};
use std::path::Path;

/// Contents of `secrets.json`.
#[derive(Deserialize, Clone, Debug)]
pub struct Secrets {
    #[serde(rename = "venmoAccessToken")]
    pub venmo_access_token: Secret<String>,
    #[serde(rename = "labelId")]
    pub label_id: String,
    /// Venmo usernames, in the order requests are sent.
    #[serde(rename = "venmoUsernames")]
    pub tenants: Vec<String>,
}

impl Secrets {
    pub fn load(path: &Path) -> SplitResult<Self> {
        if !path.exists() {
            return Err(SplitError::Config(anyhow!(
                "{} file not found",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            SplitError::Config(anyhow!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> SplitResult<Self> {
        let secrets: Secrets = serde_json::from_str(raw)
            .map_err(|e| SplitError::Config(anyhow!("invalid secrets file: {}", e)))?;
        secrets.validate()
    }

    fn validate(self) -> SplitResult<Self> {
        if self.venmo_access_token.expose_secret().trim().is_empty() {
            return Err(SplitError::Config(anyhow!("venmoAccessToken is empty")));
        }
        if self.label_id.trim().is_empty() {
            return Err(SplitError::Config(anyhow!("labelId is empty")));
        }
        if self.tenants.is_empty() {
            return Err(SplitError::Config(anyhow!("venmoUsernames lists no tenants")));
        }
        if self.tenants.iter().any(|t| t.trim().is_empty()) {
            return Err(SplitError::Config(anyhow!(
                "venmoUsernames contains a blank username"
            )));
        }
        Ok(self)
    }
}

/// Everything a run needs, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub settings: Settings,
    pub secrets: Secrets,
}

impl Config {
    pub fn from_settings(settings: Settings) -> SplitResult<Self> {
        let secrets = Secrets::load(&settings.secrets_path)?;
        Ok(Self { settings, secrets })
    }
}
