//! Input validation errors.

use thiserror::Error;

/// Errors raised while validating an inbound request, before any
/// external provider is contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The stay end date is not after the start date.
    #[error("Stay end date {end} must be after start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Guest counts are outside the allowed range.
    #[error("Invalid guest count: {0}")]
    InvalidGuestCount(String),

    /// The payment amount is missing, zero or negative.
    #[error("Payment amount must be positive")]
    NonPositiveAmount,

    /// The card-capture rail was selected but no card number was given.
    #[error("Card number is required for card payments")]
    MissingCardNumber,

    /// The payment-intent rail was selected but no intent id was given.
    #[error("Payment intent id is required")]
    MissingPaymentIntent,
}
