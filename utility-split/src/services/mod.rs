pub mod aggregator;
pub mod credentials;
pub mod dispatcher;
pub mod gmail;
pub mod traits;
pub mod venmo;

pub use aggregator::{extract_amount, sum_amounts};
pub use credentials::CredentialStore;
pub use dispatcher::{amount_due, RequestDispatcher};
pub use gmail::GmailClient;
pub use traits::{MailSource, PaymentGateway};
pub use venmo::VenmoClient;
