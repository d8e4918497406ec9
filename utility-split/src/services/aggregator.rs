//! Dollar amount extraction and summing.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use split_core::error::ExtractionError;
use std::str::FromStr;

/// One or more `$` followed immediately by digits and dots.
static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$+[0-9.]+").expect("amount pattern is valid"));

/// Parse the first dollar amount in `body`. `index` identifies the body in
/// any returned error.
pub fn extract_amount(body: &str, index: usize) -> Result<Decimal, ExtractionError> {
    let found = AMOUNT_PATTERN
        .find(body)
        .ok_or(ExtractionError::MissingAmount { index })?;

    // A sentence-ending period is punctuation, not part of the amount.
    let digits = found.as_str().trim_start_matches('$').trim_end_matches('.');
    Decimal::from_str(digits).map_err(|_| ExtractionError::MalformedAmount {
        index,
        raw: found.as_str().to_string(),
    })
}

/// Sum the first dollar amount of every body. Fails on the first body that
/// has none, or once the total no longer fits in a `Decimal`.
pub fn sum_amounts<I, S>(bodies: I) -> Result<Decimal, ExtractionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut total = Decimal::ZERO;
    for (index, body) in bodies.into_iter().enumerate() {
        let amount = extract_amount(body.as_ref(), index)?;
        tracing::debug!(index, %amount, "Extracted amount");
        total = total
            .checked_add(amount)
            .ok_or(ExtractionError::TotalOverflow { index })?;
    }
    Ok(total)
}
