//! Test helpers for utility-split integration tests.
//!
//! Stands up mock Gmail, Venmo and OAuth servers plus a scratch directory
//! holding the secrets and token files.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::NaiveDate;
use serde_json::{json, Value};
use split_core::config::Settings;
use tempfile::TempDir;
use utility_split::config::{Config, Secrets};
use utility_split::Application;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_LABEL_ID: &str = "Label_42";
pub const TEST_VENMO_TOKEN: &str = "venmo-test-token";
pub const TEST_GMAIL_TOKEN: &str = "ya29.test-gmail-token";

/// Runs in October 2024, so the bill covers September.
pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 18).unwrap()
}

pub const SEPTEMBER_QUERY: &str = "after:2024/09/01";

pub struct TestApp {
    pub gmail: MockServer,
    pub venmo: MockServer,
    pub oauth: MockServer,
    pub dir: TempDir,
    pub settings: Settings,
}

impl TestApp {
    /// Mock servers and files for the given tenants, with a valid Gmail token
    /// already cached.
    pub async fn spawn(tenants: &[&str]) -> Self {
        let gmail = MockServer::start().await;
        let venmo = MockServer::start().await;
        let oauth = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let settings = Settings {
            secrets_path: dir.path().join("secrets.json"),
            token_path: dir.path().join("token.json"),
            credentials_path: dir.path().join("credentials.json"),
            gmail_api_base_url: format!("{}/gmail/v1/users/me", gmail.uri()),
            oauth_token_url: format!("{}/token", oauth.uri()),
            venmo_api_base_url: format!("{}/v1", venmo.uri()),
            http_timeout_secs: 5,
            ..Settings::default()
        };

        let app = Self {
            gmail,
            venmo,
            oauth,
            dir,
            settings,
        };

        app.write_json(
            "secrets.json",
            &json!({
                "venmoAccessToken": TEST_VENMO_TOKEN,
                "labelId": TEST_LABEL_ID,
                "venmoUsernames": tenants,
            }),
        );
        app.write_json(
            "token.json",
            &json!({
                "access_token": TEST_GMAIL_TOKEN,
                "refresh_token": "1//refresh",
                "expires_at": "2099-01-01T00:00:00Z",
            }),
        );
        app.write_json(
            "credentials.json",
            &json!({
                "installed": {
                    "client_id": "client-id.apps.googleusercontent.com",
                    "client_secret": "client-secret",
                    "token_uri": "https://oauth2.googleapis.com/token",
                }
            }),
        );

        app
    }

    pub fn write_json(&self, name: &str, value: &Value) {
        std::fs::write(
            self.dir.path().join(name),
            serde_json::to_string_pretty(value).unwrap(),
        )
        .expect("Failed to write test file");
    }

    pub fn read_json(&self, name: &str) -> Value {
        let raw = std::fs::read_to_string(self.dir.path().join(name)).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub async fn build(&self) -> Result<Application, split_core::error::SplitError> {
        let secrets = Secrets::load(&self.settings.secrets_path)?;
        let config = Config {
            settings: self.settings.clone(),
            secrets,
        };
        Application::build(config).await
    }

    pub async fn mount_labels(&self) {
        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "labels": [
                    {"id": "INBOX", "name": "INBOX", "type": "system"},
                    {"id": TEST_LABEL_ID, "name": "Utilities", "type": "user"},
                ]
            })))
            .mount(&self.gmail)
            .await;
    }

    /// Serve `bodies` as the September messages under the test label.
    pub async fn mount_messages(&self, bodies: &[(&str, &str)]) {
        let refs: Vec<Value> = bodies
            .iter()
            .map(|(id, _)| json!({"id": id, "threadId": format!("t-{}", id)}))
            .collect();

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .and(query_param("labelIds", TEST_LABEL_ID))
            .and(query_param("q", SEPTEMBER_QUERY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": refs,
                "resultSizeEstimate": bodies.len(),
            })))
            .mount(&self.gmail)
            .await;

        for (id, body) in bodies {
            self.mount_raw_message(id, body).await;
        }
    }

    pub async fn mount_raw_message(&self, id: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/gmail/v1/users/me/messages/{}", id)))
            .and(query_param("format", "raw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "raw": URL_SAFE.encode(body),
            })))
            .mount(&self.gmail)
            .await;
    }

    pub async fn mount_venmo_user(&self, username: &str, id: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .and(query_param("query", username))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": id, "username": username, "display_name": "Test Tenant"}
                ]
            })))
            .mount(&self.venmo)
            .await;
    }
}

/// An RFC 822 message as Gmail's raw format would carry it.
pub fn utility_email(subject: &str, text: &str) -> String {
    format!(
        "From: billing@utility.example\r\nTo: me@example.com\r\nSubject: {}\r\n\r\n{}\r\n",
        subject, text
    )
}
