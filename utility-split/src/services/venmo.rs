//! Venmo API client.
//!
//! Implements user search and payment requests. Venmo models a request as a
//! payment with a negative amount.

use crate::models::{PaymentReceipt, PaymentUser};
use crate::services::traits::PaymentGateway;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use split_core::error::{SplitError, SplitResult};

const SEARCH_LIMIT: u32 = 10;

/// Body of `POST /payments`.
#[derive(Debug, Serialize)]
pub struct PaymentRequestBody<'a> {
    pub user_id: &'a str,
    /// Negative for a request, positive for a payment.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub note: &'a str,
    pub audience: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserSearchResponse {
    #[serde(default)]
    data: Vec<PaymentUser>,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    data: PaymentResponseData,
}

#[derive(Debug, Deserialize)]
struct PaymentResponseData {
    #[serde(default)]
    payment: PaymentReceipt,
}

#[derive(Debug, Deserialize)]
struct VenmoError {
    error: VenmoErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VenmoErrorDetail {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

fn error_detail(body: String) -> String {
    let parsed = serde_json::from_str::<VenmoError>(&body);
    match parsed {
        Ok(e) => match e.error.code {
            Some(code) => format!("{} (code {})", e.error.message, code),
            None => e.error.message,
        },
        Err(_) => body,
    }
}

#[derive(Clone)]
pub struct VenmoClient {
    client: Client,
    base_url: String,
    access_token: Secret<String>,
}

impl VenmoClient {
    pub fn new(client: Client, base_url: impl Into<String>, access_token: Secret<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }
}

#[async_trait]
impl PaymentGateway for VenmoClient {
    async fn search_users(&self, query: &str) -> SplitResult<Vec<PaymentUser>> {
        let url = format!("{}/users", self.base_url);
        let limit = SEARCH_LIMIT.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| SplitError::PaymentApi(anyhow!("Venmo user search failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SplitError::PaymentApi(anyhow!("Venmo user search failed: {}", e)))?;

        if !status.is_success() {
            let detail = error_detail(body);
            tracing::error!(status = %status, query, detail = %detail, "Venmo user search failed");
            return Err(SplitError::PaymentApi(anyhow!(
                "Venmo user search for '{}' failed with {}: {}",
                query,
                status,
                detail
            )));
        }

        let users: UserSearchResponse = serde_json::from_str(&body).map_err(|e| {
            SplitError::PaymentApi(anyhow!("Venmo user search response malformed: {}", e))
        })?;
        Ok(users.data)
    }

    async fn request_money(
        &self,
        user: &PaymentUser,
        amount: Decimal,
        note: &str,
    ) -> SplitResult<PaymentReceipt> {
        let failed = |reason: String| SplitError::PaymentRequest {
            username: user.username.clone(),
            reason,
        };

        let url = format!("{}/payments", self.base_url);
        let request = PaymentRequestBody {
            user_id: &user.id,
            amount: -amount,
            note,
            audience: "private",
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        tracing::debug!(status = %status, username = %user.username, "Venmo request_money response");

        if !status.is_success() {
            let detail = error_detail(body);
            tracing::error!(
                status = %status,
                username = %user.username,
                detail = %detail,
                "Venmo payment request rejected"
            );
            return Err(failed(format!("{}: {}", status, detail)));
        }

        let receipt = serde_json::from_str::<PaymentResponse>(&body)
            .map(|r| r.data.payment)
            .unwrap_or_default();

        tracing::info!(
            username = %user.username,
            payment_id = receipt.id.as_deref().unwrap_or("unknown"),
            %amount,
            "Payment request submitted"
        );
        Ok(receipt)
    }
}
