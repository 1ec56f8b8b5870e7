//! Step policies and the step-runner.
//!
//! The tolerate/abort decision for every step is declared here once,
//! per payment rail, instead of being re-derived inside the coordinator
//! at each call site. The asymmetry follows the money: before a charge
//! exists, aborting is strictly safer than proceeding; after it, a
//! cosmetically stuck booking beats losing a paid one.

use domain::PaymentRail;

use crate::error::SagaError;

/// Provider-facing steps of the orchestration that can fail after
/// validation has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepName {
    EnsureContact,
    CreateBooking,
    AdvanceToPending,
    PostInvoices,
    RecordPayment,
    ConfirmRoomStay,
}

impl StepName {
    /// Metric/log label for the step.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::EnsureContact => "ensure_contact",
            StepName::CreateBooking => "create_booking",
            StepName::AdvanceToPending => "advance_to_pending",
            StepName::PostInvoices => "post_invoices",
            StepName::RecordPayment => "record_payment",
            StepName::ConfirmRoomStay => "confirm_room_stay",
        }
    }
}

/// What a step failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure aborts the run.
    Fatal,
    /// Failure is logged and reported through a result flag; the run
    /// continues.
    Tolerated,
}

/// Per-rail policy table for the steps whose fatality depends on
/// whether money has already moved.
#[derive(Debug, Clone, Copy)]
pub struct RailPolicy {
    pub advance_to_pending: StepPolicy,
    pub post_invoices: StepPolicy,
    pub confirm_room_stay: StepPolicy,
}

impl RailPolicy {
    /// On the Stripe rail the charge is verified before any booking
    /// call, so post-booking hiccups are tolerated. On the card rail no
    /// money moves until the record-payment step, so everything before
    /// it is safe to abort.
    pub fn for_rail(rail: &PaymentRail) -> Self {
        match rail {
            PaymentRail::Stripe { .. } => Self {
                advance_to_pending: StepPolicy::Tolerated,
                post_invoices: StepPolicy::Tolerated,
                confirm_room_stay: StepPolicy::Tolerated,
            },
            PaymentRail::Card { .. } => Self {
                advance_to_pending: StepPolicy::Fatal,
                post_invoices: StepPolicy::Fatal,
                confirm_room_stay: StepPolicy::Tolerated,
            },
        }
    }
}

/// Outcome of one settled step.
#[derive(Debug)]
pub enum StepOutcome<T> {
    Completed(T),
    /// The step failed but its policy lets the run continue.
    Tolerated { reason: String },
}

impl<T> StepOutcome<T> {
    pub fn completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }
}

/// Applies a step's policy to its result: fatal errors propagate,
/// tolerated ones are logged and folded into the outcome.
pub fn settle<T>(
    step: StepName,
    policy: StepPolicy,
    result: Result<T, SagaError>,
) -> Result<StepOutcome<T>, SagaError> {
    match result {
        Ok(value) => Ok(StepOutcome::Completed(value)),
        Err(error) => match policy {
            StepPolicy::Fatal => Err(error),
            StepPolicy::Tolerated => {
                tracing::warn!(step = step.as_str(), %error, "step failed, continuing");
                metrics::counter!("booking_saga_steps_tolerated_total").increment(1);
                Ok(StepOutcome::Tolerated {
                    reason: error.to_string(),
                })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::CardDetails;

    fn card_rail() -> PaymentRail {
        PaymentRail::Card {
            card: CardDetails {
                card_number: "4111111111111111".to_string(),
                expiry_month: None,
                expiry_year: None,
                card_holder: None,
            },
        }
    }

    fn stripe_rail() -> PaymentRail {
        PaymentRail::Stripe {
            payment_intent_id: "pi_1".to_string(),
        }
    }

    #[test]
    fn stripe_rail_tolerates_post_booking_failures() {
        let policy = RailPolicy::for_rail(&stripe_rail());
        assert_eq!(policy.advance_to_pending, StepPolicy::Tolerated);
        assert_eq!(policy.post_invoices, StepPolicy::Tolerated);
        assert_eq!(policy.confirm_room_stay, StepPolicy::Tolerated);
    }

    #[test]
    fn card_rail_aborts_before_money_moves() {
        let policy = RailPolicy::for_rail(&card_rail());
        assert_eq!(policy.advance_to_pending, StepPolicy::Fatal);
        assert_eq!(policy.post_invoices, StepPolicy::Fatal);
        assert_eq!(policy.confirm_room_stay, StepPolicy::Tolerated);
    }

    #[test]
    fn settle_propagates_fatal_errors() {
        let result: Result<StepOutcome<()>, _> = settle(
            StepName::PostInvoices,
            StepPolicy::Fatal,
            Err(SagaError::InvoicePosting("boom".to_string())),
        );
        assert!(result.is_err());
    }

    #[test]
    fn settle_folds_tolerated_errors_into_outcome() {
        let result: StepOutcome<()> = settle(
            StepName::PostInvoices,
            StepPolicy::Tolerated,
            Err(SagaError::InvoicePosting("boom".to_string())),
        )
        .unwrap();
        assert!(!result.completed());
    }
}
