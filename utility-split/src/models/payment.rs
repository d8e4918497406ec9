use rust_decimal::Decimal;
use serde::Deserialize;

/// A Venmo account as returned by user search.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PaymentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Result of a submitted payment request.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PaymentReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One tenant's outcome within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRequest {
    pub username: String,
    pub user_id: String,
    /// `None` when the request was not submitted (dry run).
    pub receipt: Option<PaymentReceipt>,
}

/// Summary of a dispatch pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub total: Decimal,
    pub amount_due: Decimal,
    pub note: String,
    pub requests: Vec<TenantRequest>,
    pub dry_run: bool,
}

impl DispatchReport {
    /// True when nothing was owed and no tenant was contacted.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
