use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::currency::Currency;

/// Errors raised by the tax engine and its input adapters.
///
/// Every violated precondition gets its own variant carrying the offending
/// values, so callers can match on the exact failure instead of inspecting
/// message strings. All failures are deterministic input-validation errors;
/// retrying reproduces the same result.
#[derive(thiserror::Error, Debug)]
pub enum TaxError {
    /// Negative amount, non-positive exchange rate, or negative share quantity.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Which value violated the precondition.
        reason: String,
    },
    /// A foreign-currency value arrived without an explicit exchange rate.
    #[error("missing exchange rate for {currency} conversion")]
    MissingExchangeRate {
        /// The foreign currency of the amount.
        currency: Currency,
    },
    /// A foreign-currency value arrived without a conversion date.
    #[error("missing conversion date for {currency} conversion")]
    MissingConversionDate {
        /// The foreign currency of the amount.
        currency: Currency,
    },
    /// The (source, target) pair is not configured on the converter.
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: Currency, to: Currency },
    /// A sale dated before its reference or acquisition date.
    #[error("sale date {sale} is before reference date {reference}")]
    InvalidDateOrder {
        reference: NaiveDate,
        sale: NaiveDate,
    },
    /// Cumulative shares sold exceed the shares vested.
    #[error("{sold} shares sold against {vested} vested")]
    OverAllocation { vested: Decimal, sold: Decimal },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A record date string not in `YYYY-MM-DD` form.
    #[error("invalid date '{value}'")]
    InvalidDate {
        /// The unparseable input.
        value: String,
    },
    /// A record currency code outside the supported set.
    #[error("unknown currency code '{code}'")]
    UnknownCurrency {
        /// The unrecognized code.
        code: String,
    },
}
