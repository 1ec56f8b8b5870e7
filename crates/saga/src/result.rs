//! Outcome types returned by an orchestration run.

use chrono::NaiveDate;
use common::{BookingId, ContactId};
use domain::RoomStayStatus;
use serde::Serialize;

use crate::error::SagaError;

/// Aggregate returned on a successful run. Soft steps report through
/// the boolean flags instead of failing the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub booking_id: BookingId,
    pub booking_reference: String,
    /// Reported lowercase ("enquiry", "pending", "confirmed") per the
    /// frontend contract.
    #[serde(serialize_with = "serialize_status")]
    pub status: RoomStayStatus,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub contact_id: ContactId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    pub invoice_posted: bool,
    pub webhook_sent: bool,
}

fn serialize_status<S: serde::Serializer>(
    status: &RoomStayStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_response_str())
}

/// Partial-state snapshot reported with every failure so support staff
/// can resume manually.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaDebug {
    pub contact_created: bool,
    pub contact_id: Option<ContactId>,
    pub booking_created: bool,
    pub booking_id: Option<BookingId>,
    pub invoice_posted: bool,
}

/// A failed run: the fatal error plus everything the caller needs for
/// reconciliation.
#[derive(Debug)]
pub struct SagaFailure {
    pub error: SagaError,
    /// Human-actionable note carrying the payment reference whenever a
    /// confirmed charge exists. Never dropped once set.
    pub warning: Option<String>,
    pub debug: SagaDebug,
}

impl SagaFailure {
    pub(crate) fn new(error: SagaError) -> Self {
        Self {
            error,
            warning: None,
            debug: SagaDebug::default(),
        }
    }
}

impl std::fmt::Display for SagaFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
