//! Capabilities the run needs from the mail and payment providers.

use crate::models::{MailLabel, MessageRef, PaymentReceipt, PaymentUser};
use async_trait::async_trait;
use rust_decimal::Decimal;
use split_core::error::SplitResult;

#[async_trait]
pub trait MailSource: Send + Sync {
    async fn list_labels(&self) -> SplitResult<Vec<MailLabel>>;

    /// All messages carrying `label_id` that match the search `query`.
    async fn list_messages(&self, label_id: &str, query: &str) -> SplitResult<Vec<MessageRef>>;

    /// Full RFC 822 text of a message.
    async fn raw_message(&self, message_id: &str) -> SplitResult<String>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn search_users(&self, query: &str) -> SplitResult<Vec<PaymentUser>>;

    /// Ask `user` to pay `amount`.
    async fn request_money(
        &self,
        user: &PaymentUser,
        amount: Decimal,
        note: &str,
    ) -> SplitResult<PaymentReceipt>;
}
