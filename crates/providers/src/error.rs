//! Provider error taxonomy.

use thiserror::Error;

/// Errors surfaced by the booking provider client.
///
/// Each operation maps its non-2xx responses to a dedicated variant so
/// the saga can apply its tolerate/abort policy per step without
/// inspecting HTTP details. Network failures are never retried here;
/// retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Authentication against the provider's token endpoint failed.
    #[error("Provider authentication failed: {0}")]
    Auth(String),

    /// Contact creation was rejected.
    #[error("Contact creation failed: {0}")]
    ContactCreation(String),

    /// Booking creation was rejected.
    #[error("Booking creation failed: {0}")]
    BookingCreation(String),

    /// A room stay status update was rejected.
    #[error("Room stay status update failed: {0}")]
    StatusUpdate(String),

    /// An invoice could not be posted.
    #[error("Invoice posting failed: {0}")]
    InvoicePosting(String),

    /// A payment record was rejected by the provider.
    #[error("Payment recording failed: {0}")]
    PaymentRecording(String),

    /// A read (booking, room stays, invoices, payments, availability)
    /// was rejected.
    #[error("Provider lookup failed: {0}")]
    Lookup(String),

    /// The request never completed (timeout, connection error).
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a body this client cannot decode.
    #[error("Unexpected provider response: {0}")]
    Decode(String),
}

/// Errors from the payment gateway. The saga branches on these; they
/// never escape as a panic.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway rejected the request (bad key, unknown intent, ...).
    #[error("Payment gateway rejected the request: {0}")]
    Api(String),

    /// The request never completed.
    #[error("Payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be interpreted.
    #[error("Unexpected payment gateway response: {0}")]
    Decode(String),
}
