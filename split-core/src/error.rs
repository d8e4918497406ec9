use thiserror::Error;

/// Failure to pull a dollar amount out of a single message body.
///
/// `index` is the position of the body in the sequence handed to the
/// aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("message #{index} contains no dollar amount")]
    MissingAmount { index: usize },

    #[error("message #{index} contains a malformed dollar amount: {raw}")]
    MalformedAmount { index: usize, raw: String },

    #[error("adding message #{index} overflows the running total")]
    TotalOverflow { index: usize },
}

impl ExtractionError {
    pub fn index(&self) -> usize {
        match self {
            ExtractionError::MissingAmount { index } => *index,
            ExtractionError::MalformedAmount { index, .. } => *index,
            ExtractionError::TotalOverflow { index } => *index,
        }
    }
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Authentication error: {0}")]
    Auth(anyhow::Error),

    #[error("Mail API error: {0}")]
    MailApi(anyhow::Error),

    #[error("Could not read amount from message {message_id}: {source}")]
    Extraction {
        message_id: String,
        #[source]
        source: ExtractionError,
    },

    #[error("No payment account found for tenant '{username}'")]
    TenantNotFound { username: String },

    #[error("Payment request to '{username}' failed: {reason}")]
    PaymentRequest { username: String, reason: String },

    #[error("Payment API error: {0}")]
    PaymentApi(anyhow::Error),
}

impl SplitError {
    /// Name of the run stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            SplitError::Config(_) => "configuration",
            SplitError::Auth(_) => "auth",
            SplitError::MailApi(_) => "mail",
            SplitError::Extraction { .. } => "extraction",
            SplitError::TenantNotFound { .. } => "tenant-lookup",
            SplitError::PaymentRequest { .. } => "payment-request",
            SplitError::PaymentApi(_) => "payment",
        }
    }
}

impl From<config::ConfigError> for SplitError {
    fn from(err: config::ConfigError) -> Self {
        SplitError::Config(anyhow::Error::new(err))
    }
}

pub type SplitResult<T> = Result<T, SplitError>;
