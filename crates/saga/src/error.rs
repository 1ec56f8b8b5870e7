//! Saga error taxonomy.
//!
//! Each variant corresponds to one step of the orchestration, so a
//! caller can tell from the error alone how far the run got and
//! whether money may already have moved.

use domain::ValidationError;
use providers::ProviderError;
use thiserror::Error;

/// Errors that abort an orchestration run.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed or missing input; raised before any external call.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Payment-rail verification failed, mismatched or incomplete.
    #[error("Payment verification failed: {0}")]
    PaymentVerification(String),

    /// Guest contact could not be created.
    #[error("Failed to create guest contact: {0}")]
    ContactCreation(String),

    /// Booking could not be created.
    #[error("Failed to create booking: {0}")]
    BookingCreation(String),

    /// Room stay status transition was rejected (fatal only before
    /// money has moved).
    #[error("Failed to update booking status: {0}")]
    StatusUpdate(String),

    /// Invoice posting failed (fatal only before money has moved).
    #[error("Failed to post invoice: {0}")]
    InvoicePosting(String),

    /// The provider rejected the payment record. On the card rail this
    /// is the one legitimate "payment processing failed" error.
    #[error("Payment processing failed: {0}")]
    PaymentRecording(String),

    /// Upstream authentication failed; nothing can proceed.
    #[error("Upstream authentication failed: {0}")]
    ProviderAuth(String),
}

impl SagaError {
    /// Short machine-readable label used in failure envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => "validation_error",
            SagaError::PaymentVerification(_) => "payment_verification_failed",
            SagaError::ContactCreation(_) => "contact_creation_failed",
            SagaError::BookingCreation(_) => "booking_creation_failed",
            SagaError::StatusUpdate(_) => "status_update_failed",
            SagaError::InvoicePosting(_) => "invoice_posting_failed",
            SagaError::PaymentRecording(_) => "payment_processing_failed",
            SagaError::ProviderAuth(_) => "upstream_authentication_failed",
        }
    }
}

/// Maps a provider error raised at a given step to the step's error,
/// letting authentication failures through as their own class.
pub(crate) fn classify(step: crate::step::StepName, err: ProviderError) -> SagaError {
    if let ProviderError::Auth(message) = err {
        return SagaError::ProviderAuth(message);
    }
    let message = err.to_string();
    match step {
        crate::step::StepName::EnsureContact => SagaError::ContactCreation(message),
        crate::step::StepName::CreateBooking => SagaError::BookingCreation(message),
        crate::step::StepName::AdvanceToPending | crate::step::StepName::ConfirmRoomStay => {
            SagaError::StatusUpdate(message)
        }
        crate::step::StepName::PostInvoices => SagaError::InvoicePosting(message),
        crate::step::StepName::RecordPayment => SagaError::PaymentRecording(message),
    }
}
