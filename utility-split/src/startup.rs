use crate::config::Config;
use crate::models::{BillingPeriod, DispatchReport};
use crate::services::{
    sum_amounts, CredentialStore, GmailClient, MailSource, PaymentGateway, RequestDispatcher,
    VenmoClient,
};
use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use split_core::error::{SplitError, SplitResult};
use std::time::Duration;

/// One utility split run, wired to its mail and payment collaborators.
pub struct Application {
    config: Config,
    mail: Box<dyn MailSource>,
    payments: Box<dyn PaymentGateway>,
}

impl Application {
    /// Wire up the Gmail and Venmo clients, refreshing the Gmail token if
    /// needed.
    pub async fn build(config: Config) -> SplitResult<Self> {
        let settings = &config.settings;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .map_err(|e| SplitError::Config(anyhow!("failed to build HTTP client: {}", e)))?;

        let credentials = CredentialStore::new(
            http.clone(),
            &settings.token_path,
            &settings.credentials_path,
            &settings.oauth_token_url,
        );
        let gmail_token = credentials.access_token(Utc::now()).await?;

        let mail = GmailClient::new(http.clone(), &settings.gmail_api_base_url, gmail_token);
        let payments = VenmoClient::new(
            http,
            &settings.venmo_api_base_url,
            config.secrets.venmo_access_token.clone(),
        );

        tracing::info!(
            tenants = config.secrets.tenants.len(),
            dry_run = settings.dry_run,
            "Utility split configured"
        );

        Ok(Self::with_collaborators(
            config,
            Box::new(mail),
            Box::new(payments),
        ))
    }

    pub fn with_collaborators(
        config: Config,
        mail: Box<dyn MailSource>,
        payments: Box<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config,
            mail,
            payments,
        }
    }

    /// Bill the month before `today`.
    pub async fn run(&self, today: NaiveDate) -> SplitResult<DispatchReport> {
        let secrets = &self.config.secrets;
        let period = BillingPeriod::from_today(today);
        tracing::info!(period = %period, start = %period.start(), "Computing utility split");

        let labels = self.mail.list_labels().await?;
        let label = labels
            .iter()
            .find(|l| l.id == secrets.label_id)
            .ok_or_else(|| {
                SplitError::MailApi(anyhow!("label '{}' does not exist", secrets.label_id))
            })?;
        tracing::info!(label_id = %label.id, label_name = %label.name, "Reading labelled mail");

        let messages = self
            .mail
            .list_messages(&secrets.label_id, &period.search_query())
            .await?;
        tracing::info!(message_count = messages.len(), "Found utility messages");

        let mut bodies = Vec::with_capacity(messages.len());
        for message in &messages {
            bodies.push(self.mail.raw_message(&message.id).await?);
        }

        let total = sum_amounts(&bodies).map_err(|source| SplitError::Extraction {
            message_id: messages[source.index()].id.clone(),
            source,
        })?;
        tracing::info!(%total, "Utilities total");

        RequestDispatcher::new(
            self.payments.as_ref(),
            &secrets.tenants,
            self.config.settings.dry_run,
        )
        .dispatch(total, &period)
        .await
    }
}
