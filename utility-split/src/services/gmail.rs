//! Gmail REST client.
//!
//! Covers the three read-only calls the run needs: label listing, message
//! search and raw message download.

use crate::models::{MailLabel, MessageRef};
use crate::services::traits::MailSource;
use anyhow::anyhow;
use async_trait::async_trait;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use split_core::error::{SplitError, SplitResult};

/// Gmail emits URL-safe base64, sometimes without padding.
const RAW_MESSAGE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<MailLabel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePage {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct GmailError {
    error: GmailErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GmailErrorDetail {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    base_url: String,
    access_token: Secret<String>,
}

impl GmailClient {
    /// `base_url` points at a mailbox, e.g.
    /// `https://gmail.googleapis.com/gmail/v1/users/me`.
    pub fn new(client: Client, base_url: impl Into<String>, access_token: Secret<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, op: &str) -> SplitResult<T> {
        let response = request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| SplitError::MailApi(anyhow!("Gmail {} request failed: {}", op, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SplitError::MailApi(anyhow!("Gmail {} response unreadable: {}", op, e)))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                SplitError::MailApi(anyhow!("Gmail {} response malformed: {}", op, e))
            });
        }

        let detail = serde_json::from_str::<GmailError>(&body)
            .map(|e| format!("{} {}", e.error.code, e.error.message))
            .unwrap_or(body);
        tracing::error!(status = %status, op, detail = %detail, "Gmail request failed");

        if status == StatusCode::UNAUTHORIZED {
            Err(SplitError::Auth(anyhow!(
                "Gmail rejected the access token: {}",
                detail
            )))
        } else {
            Err(SplitError::MailApi(anyhow!(
                "Gmail {} failed with {}: {}",
                op,
                status,
                detail
            )))
        }
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_labels(&self) -> SplitResult<Vec<MailLabel>> {
        let url = format!("{}/labels", self.base_url);
        let list: LabelList = self.send(self.client.get(&url), "list labels").await?;
        Ok(list.labels)
    }

    async fn list_messages(&self, label_id: &str, query: &str) -> SplitResult<Vec<MessageRef>> {
        let url = format!("{}/messages", self.base_url);
        let mut messages = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("labelIds", label_id), ("q", query)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: MessagePage = self.send(request, "list messages").await?;
            messages.extend(page.messages);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(label_id, query, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    async fn raw_message(&self, message_id: &str) -> SplitResult<String> {
        let url = format!("{}/messages/{}", self.base_url, message_id);
        let message: RawMessage = self
            .send(
                self.client.get(&url).query(&[("format", "raw")]),
                "get message",
            )
            .await?;

        decode_raw(&message.raw).map_err(|e| {
            SplitError::MailApi(anyhow!("message {} has an undecodable body: {}", message_id, e))
        })
    }
}

/// Decode Gmail's `raw` field into text. Invalid UTF-8 is replaced rather
/// than rejected.
pub fn decode_raw(raw: &str) -> Result<String, base64::DecodeError> {
    let bytes = RAW_MESSAGE_ENGINE.decode(raw.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_raw_with_and_without_padding() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("Total: $12.40");
        let unpadded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("Total: $12.40");
        assert_eq!(decode_raw(&padded).unwrap(), "Total: $12.40");
        assert_eq!(decode_raw(&unpadded).unwrap(), "Total: $12.40");
    }

    #[test]
    fn test_decode_raw_url_safe_alphabet() {
        let bytes = [0xfb_u8, 0xff, 0xbf];
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(bytes);
        assert!(encoded.contains('-') || encoded.contains('_'));
        assert!(decode_raw(&encoded).is_ok());
    }

    #[test]
    fn test_decode_raw_rejects_garbage() {
        assert!(decode_raw("not*base64").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GmailClient::new(
            Client::new(),
            "http://localhost/gmail/v1/users/me/",
            Secret::new("t".to_string()),
        );
        assert_eq!(client.base_url, "http://localhost/gmail/v1/users/me");
    }
}
