//! Splits the total and sends one payment request per tenant.

use crate::models::{BillingPeriod, DispatchReport, PaymentUser, TenantRequest};
use crate::services::traits::PaymentGateway;
use rust_decimal::{Decimal, RoundingStrategy};
use split_core::error::{SplitError, SplitResult};

/// Each tenant's share. The requester keeps one share, hence `+ 1`.
pub fn amount_due(total: Decimal, tenant_count: usize) -> Decimal {
    let shares = Decimal::from(tenant_count as u64 + 1);
    (total / shares).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prefer an exact username hit, otherwise take the first result.
fn pick_user(username: &str, mut users: Vec<PaymentUser>) -> Option<PaymentUser> {
    let exact = users
        .iter()
        .position(|u| u.username.eq_ignore_ascii_case(username));
    match exact {
        Some(index) => Some(users.swap_remove(index)),
        None => users.into_iter().next(),
    }
}

pub struct RequestDispatcher<'a> {
    gateway: &'a dyn PaymentGateway,
    tenants: &'a [String],
    dry_run: bool,
}

impl<'a> RequestDispatcher<'a> {
    pub fn new(gateway: &'a dyn PaymentGateway, tenants: &'a [String], dry_run: bool) -> Self {
        Self {
            gateway,
            tenants,
            dry_run,
        }
    }

    pub async fn dispatch(&self, total: Decimal, period: &BillingPeriod) -> SplitResult<DispatchReport> {
        let amount_due = amount_due(total, self.tenants.len());
        let note = period.note();
        let mut report = DispatchReport {
            total,
            amount_due,
            note,
            requests: Vec::with_capacity(self.tenants.len()),
            dry_run: self.dry_run,
        };

        if amount_due.is_zero() {
            tracing::warn!(%total, "Nothing to bill, no payment requests sent");
            return Ok(report);
        }

        tracing::info!(
            %total,
            %amount_due,
            tenants = self.tenants.len(),
            note = %report.note,
            "Requesting utility shares"
        );

        for username in self.tenants {
            let users = self.gateway.search_users(username).await?;
            let user = pick_user(username, users).ok_or_else(|| SplitError::TenantNotFound {
                username: username.clone(),
            })?;

            let receipt = if self.dry_run {
                tracing::info!(tenant = %username, user_id = %user.id, %amount_due, "Dry run, request not sent");
                None
            } else {
                Some(
                    self.gateway
                        .request_money(&user, amount_due, &report.note)
                        .await?,
                )
            };

            report.requests.push(TenantRequest {
                username: username.clone(),
                user_id: user.id,
                receipt,
            });
        }

        Ok(report)
    }
}
