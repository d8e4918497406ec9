pub mod billing;
pub mod mail;
pub mod payment;

pub use billing::{month_label, previous_month_start, BillingPeriod};
pub use mail::{MailLabel, MessageRef};
pub use payment::{DispatchReport, PaymentReceipt, PaymentUser, TenantRequest};
