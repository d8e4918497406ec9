//! Cached Gmail OAuth credentials.
//!
//! `token.json` holds the last access token and, when granted, a refresh
//! token. Expired tokens are refreshed with the OAuth client from
//! `credentials.json` and written back. Obtaining the first token is left to
//! the operator.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use split_core::error::{SplitError, SplitResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Tokens this close to expiry are refreshed up front.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absent means the token never expires as far as we know.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at
                .checked_sub_signed(Duration::seconds(EXPIRY_SKEW_SECS))
                .map_or(false, |refresh_at| refresh_at > now),
            None => true,
        }
    }
}

/// Google client secrets file. Desktop clients nest under `installed`, web
/// clients under `web`.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<OAuthClient>,
    web: Option<OAuthClient>,
}

#[derive(Debug, Deserialize)]
struct OAuthClient {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct CredentialStore {
    client: Client,
    token_path: PathBuf,
    credentials_path: PathBuf,
    token_url: String,
}

impl CredentialStore {
    pub fn new(
        client: Client,
        token_path: impl Into<PathBuf>,
        credentials_path: impl Into<PathBuf>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_path: token_path.into(),
            credentials_path: credentials_path.into(),
            token_url: token_url.into(),
        }
    }

    /// A usable Gmail access token, refreshing the cache when needed.
    pub async fn access_token(&self, now: DateTime<Utc>) -> SplitResult<Secret<String>> {
        let cached = self.load_token()?;

        if cached.is_valid_at(now) {
            tracing::debug!("Using cached Gmail access token");
            return Ok(Secret::new(cached.access_token));
        }

        tracing::info!("Cached Gmail access token expired, refreshing");
        let refreshed = self.refresh(&cached, now).await?;
        self.save_token(&refreshed)?;
        Ok(Secret::new(refreshed.access_token))
    }

    fn load_token(&self) -> SplitResult<CachedToken> {
        if !self.token_path.exists() {
            return Err(SplitError::Auth(anyhow!(
                "no cached Gmail credentials at {}; authorize the app once and save the token there",
                self.token_path.display()
            )));
        }

        let raw = std::fs::read_to_string(&self.token_path).map_err(|e| {
            SplitError::Auth(anyhow!("failed to read {}: {}", self.token_path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            SplitError::Auth(anyhow!("invalid token cache {}: {}", self.token_path.display(), e))
        })
    }

    fn save_token(&self, token: &CachedToken) -> SplitResult<()> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| SplitError::Auth(anyhow!("failed to encode token cache: {}", e)))?;
        let write_failed = |e: std::io::Error| {
            SplitError::Auth(anyhow!(
                "failed to write {}: {}",
                self.token_path.display(),
                e
            ))
        };

        // Staged beside the cache, then renamed over it.
        let dir = match self.token_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(write_failed)?;
        staged.write_all(json.as_bytes()).map_err(write_failed)?;
        staged
            .persist(&self.token_path)
            .map_err(|e| write_failed(e.error))?;
        Ok(())
    }

    async fn refresh(&self, cached: &CachedToken, now: DateTime<Utc>) -> SplitResult<CachedToken> {
        let refresh_token = cached.refresh_token.as_deref().ok_or_else(|| {
            SplitError::Auth(anyhow!(
                "Gmail access token expired and {} has no refresh token",
                self.token_path.display()
            ))
        })?;
        let oauth = load_client(&self.credentials_path)?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| SplitError::Auth(anyhow!("token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %err_body, "Google token refresh error");
            return Err(SplitError::Auth(anyhow!(
                "token refresh rejected with {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SplitError::Auth(anyhow!("malformed token refresh response: {}", e)))?;

        let expires_at = match token.expires_in {
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        SplitError::Auth(anyhow!(
                            "token refresh returned an out-of-range expires_in: {}",
                            secs
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(CachedToken {
            access_token: token.access_token,
            // Google only returns a refresh token when it rotates it.
            refresh_token: token.refresh_token.or_else(|| cached.refresh_token.clone()),
            expires_at,
        })
    }
}

fn load_client(path: &Path) -> SplitResult<OAuthClient> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SplitError::Auth(anyhow!(
            "failed to read OAuth client file {}: {}",
            path.display(),
            e
        ))
    })?;
    let secrets: ClientSecrets = serde_json::from_str(&raw).map_err(|e| {
        SplitError::Auth(anyhow!("invalid OAuth client file {}: {}", path.display(), e))
    })?;

    secrets
        .installed
        .or(secrets.web)
        .ok_or_else(|| SplitError::Auth(anyhow!("{} has no OAuth client", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, hour, min, 0).unwrap()
    }

    fn token(expires_at: Option<DateTime<Utc>>) -> CachedToken {
        CachedToken {
            access_token: "ya29.token".to_string(),
            refresh_token: None,
            expires_at,
        }
    }

    #[test]
    fn test_token_validity_with_skew() {
        let t = token(Some(at(12, 0)));
        assert!(t.is_valid_at(at(11, 0)));
        assert!(!t.is_valid_at(at(11, 59)));
        assert!(!t.is_valid_at(at(12, 30)));
    }

    #[test]
    fn test_expiry_at_the_calendar_floor_is_not_valid() {
        let t = token(Some(DateTime::<Utc>::MIN_UTC));
        assert!(!t.is_valid_at(at(9, 0)));
    }

    #[test]
    fn test_save_token_replaces_cache_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        std::fs::write(&token_path, "{\"access_token\": \"old\"}").unwrap();

        let store = CredentialStore::new(
            Client::new(),
            &token_path,
            dir.path().join("credentials.json"),
            "http://127.0.0.1:9/token",
        );
        store.save_token(&token(Some(at(12, 0)))).unwrap();

        let saved: CachedToken =
            serde_json::from_str(&std::fs::read_to_string(&token_path).unwrap()).unwrap();
        assert_eq!(saved.access_token, "ya29.token");
        assert_eq!(saved.expires_at, Some(at(12, 0)));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("token.json")]);
    }

    #[test]
    fn test_token_without_expiry_is_valid() {
        assert!(token(None).is_valid_at(at(23, 59)));
    }

    #[tokio::test]
    async fn test_missing_cache_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(
            Client::new(),
            dir.path().join("token.json"),
            dir.path().join("credentials.json"),
            "http://127.0.0.1:9/token",
        );

        let err = store.access_token(at(9, 0)).await.unwrap_err();
        assert_eq!(err.stage(), "auth");
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        std::fs::write(
            &token_path,
            serde_json::to_string(&token(Some(at(8, 0)))).unwrap(),
        )
        .unwrap();

        let store = CredentialStore::new(
            Client::new(),
            &token_path,
            dir.path().join("credentials.json"),
            "http://127.0.0.1:9/token",
        );

        let err = store.access_token(at(9, 0)).await.unwrap_err();
        assert!(err.to_string().contains("no refresh token"));
    }

    #[test]
    fn test_load_client_accepts_web_clients() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"web": {"client_id": "id.apps", "client_secret": "shh"}}"#,
        )
        .unwrap();

        let client = load_client(&path).unwrap();
        assert_eq!(client.client_id, "id.apps");
    }
}
