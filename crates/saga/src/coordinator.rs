//! The booking-with-payment orchestration saga.
//!
//! Drives the sequential step machine against the booking provider and
//! the payment gateway:
//!
//! ```text
//! ValidateInput ─► VerifyPayment ─► EnsureContact ─► CreateBooking
//!   ─► AdvanceToPending ─► PostInvoices ─► RecordPayment
//!   ─► ConfirmRoomStay ─► Notify ─► Respond
//! ```
//!
//! VerifyPayment and Notify only run on the Stripe rail. Steps 5, 6 and
//! 8 are tolerated or fatal depending on whether money has already
//! moved; the policy lives in [`crate::step::RailPolicy`], not here.

use std::sync::Arc;

use common::RoomStayId;
use domain::{
    CardNetwork, GuestDetails, PaymentDetails, PaymentRail, RoomStayStatus, StayDetails,
    UnitSelection, local_payment_reference,
};
use providers::{
    Booking, BookingApi, BookingDefaults, BookingSummary, NewBooking, NotificationSink,
    PaymentGateway, PaymentRecord, PaymentVerification,
};

use crate::error::{SagaError, classify};
use crate::result::{OrchestrationResult, SagaDebug, SagaFailure};
use crate::step::{RailPolicy, StepName, StepOutcome, StepPolicy, settle};

/// Verified and requested amounts may differ by at most one minor unit.
const AMOUNT_TOLERANCE_MINOR: i64 = 1;

/// One inbound booking request, payment aside.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub guest: GuestDetails,
    pub stay: StayDetails,
    pub unit: UnitSelection,
}

/// Accumulated partial state of one run, reported on failure.
struct RunState {
    debug: SagaDebug,
    warning: Option<String>,
}

impl RunState {
    fn new() -> Self {
        Self {
            debug: SagaDebug::default(),
            warning: None,
        }
    }

    fn failure(&self, error: SagaError) -> SagaFailure {
        SagaFailure {
            error,
            warning: self.warning.clone(),
            debug: self.debug.clone(),
        }
    }
}

/// Orchestrates booking creation against the two external providers.
///
/// Holds no per-run state; concurrent runs are independent. The only
/// shared mutable state in the process is the provider token cache
/// inside the booking client.
pub struct BookingSaga {
    booking_api: Arc<dyn BookingApi>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    defaults: BookingDefaults,
}

impl BookingSaga {
    pub fn new(
        booking_api: Arc<dyn BookingApi>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
        defaults: BookingDefaults,
    ) -> Self {
        Self {
            booking_api,
            gateway,
            notifier,
            defaults,
        }
    }

    /// Runs the full booking-with-payment saga.
    ///
    /// The rail is selected from the request: a `payment_intent_id`
    /// means the charge already happened at the gateway and only needs
    /// verification; otherwise raw card fields are submitted to the
    /// booking provider at the record-payment step.
    #[tracing::instrument(skip_all, fields(guest = %request.guest.email))]
    pub async fn create_with_payment(
        &self,
        request: BookingRequest,
        payment: PaymentDetails,
        payment_intent_id: Option<String>,
    ) -> Result<OrchestrationResult, SagaFailure> {
        metrics::counter!("booking_saga_runs_total").increment(1);
        let started = std::time::Instant::now();

        let result = self
            .run_with_payment(request, payment, payment_intent_id)
            .await;

        metrics::histogram!("booking_saga_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if let Err(failure) = &result {
            metrics::counter!("booking_saga_failures_total").increment(1);
            tracing::warn!(error = %failure.error, "booking saga aborted");
        }
        result
    }

    async fn run_with_payment(
        &self,
        request: BookingRequest,
        payment: PaymentDetails,
        payment_intent_id: Option<String>,
    ) -> Result<OrchestrationResult, SagaFailure> {
        // Step 1: ValidateInput. No external call may happen before the
        // verdict.
        request
            .guest
            .validate()
            .map_err(|e| SagaFailure::new(e.into()))?;
        request
            .stay
            .validate()
            .map_err(|e| SagaFailure::new(e.into()))?;
        let rail = PaymentRail::select(&payment, payment_intent_id.as_deref())
            .map_err(|e| SagaFailure::new(e.into()))?;
        let policy = RailPolicy::for_rail(&rail);

        let mut state = RunState::new();

        // Step 2: VerifyPayment (Stripe rail). Aborting here is safe:
        // either no money moved, or the charge is unusable and the
        // caller is told not to charge again.
        let verification = match &rail {
            PaymentRail::Stripe { payment_intent_id } => {
                let verification = self
                    .verify_intent(payment_intent_id, &payment)
                    .await
                    .map_err(|e| state.failure(e))?;
                // From here on, real money is attached to this run.
                state.warning = Some(format!(
                    "A payment of {} {} was already captured (reference {}). \
                     Contact support with this reference before retrying, to avoid a double charge.",
                    verification.amount, verification.currency, payment_intent_id
                ));
                Some(verification)
            }
            PaymentRail::Card { .. } => None,
        };

        // Step 3: EnsureContact.
        let contact = self
            .booking_api
            .create_contact(&request.guest)
            .await
            .map_err(|e| state.failure(classify(StepName::EnsureContact, e)))?;
        state.debug.contact_created = true;
        state.debug.contact_id = Some(contact.id);
        tracing::info!(contact_id = %contact.id, "contact ensured");

        // Step 4: CreateBooking, room stay starts in ENQUIRY.
        let new_booking = NewBooking {
            contact: contact.clone(),
            defaults: self.defaults,
            notes: format!("Web booking with payment for {}", request.guest.full_name()),
            stay: request.stay,
            unit: request.unit.clone(),
        };
        let booking = self
            .booking_api
            .create_booking(&new_booking)
            .await
            .map_err(|e| state.failure(classify(StepName::CreateBooking, e)))?;
        state.debug.booking_created = true;
        state.debug.booking_id = Some(booking.id);
        tracing::info!(booking_id = %booking.id, reference = %booking.booking_reference, "booking created");

        // Step 5: AdvanceToPending.
        let mut status = RoomStayStatus::Enquiry;
        let room_stay = match settle(
            StepName::AdvanceToPending,
            policy.advance_to_pending,
            self.resolve_room_stay(&booking).await,
        )
        .map_err(|e| state.failure(e))?
        {
            StepOutcome::Completed(id) => Some(id),
            StepOutcome::Tolerated { .. } => None,
        };
        if let Some(room_stay_id) = room_stay {
            let advanced = settle(
                StepName::AdvanceToPending,
                policy.advance_to_pending,
                self.booking_api
                    .update_room_stay_status(booking.id, room_stay_id, RoomStayStatus::Pending)
                    .await
                    .map_err(|e| classify(StepName::AdvanceToPending, e)),
            )
            .map_err(|e| state.failure(e))?;
            if advanced.completed() {
                status = RoomStayStatus::Pending;
            }
        }

        // Step 6: PostInvoices. Bookings without invoices are fine.
        let invoices_outcome = settle(
            StepName::PostInvoices,
            policy.post_invoices,
            self.post_pending_invoices(&booking).await,
        )
        .map_err(|e| state.failure(e))?;
        let invoice_posted = invoices_outcome.completed();
        state.debug.invoice_posted = invoice_posted;

        // Step 7: RecordPayment. On the card rail this is where money
        // moves; afterwards no fatal step remains.
        let record = build_payment_record(&rail, &payment, verification.as_ref());
        self.booking_api
            .create_payment(booking.id, &record)
            .await
            .map_err(|e| state.failure(classify(StepName::RecordPayment, e)))?;
        tracing::info!(reference = %record.payment_reference, "payment recorded");

        // Step 8: ConfirmRoomStay. A paid booking stuck in PENDING is
        // recoverable by support without re-charging, so never fatal.
        if let Some(room_stay_id) = room_stay {
            let confirmed = settle(
                StepName::ConfirmRoomStay,
                policy.confirm_room_stay,
                self.booking_api
                    .update_room_stay_status(booking.id, room_stay_id, RoomStayStatus::Confirmed)
                    .await
                    .map_err(|e| classify(StepName::ConfirmRoomStay, e)),
            )
            .map_err(|e| state.failure(e))?;
            if confirmed.completed() {
                status = RoomStayStatus::Confirmed;
            }
        }

        // Step 9: Notify (Stripe rail). Best effort only.
        let webhook_sent = match &rail {
            PaymentRail::Stripe { .. } => {
                let summary = BookingSummary {
                    guest_name: request.guest.full_name(),
                    email: request.guest.email.clone(),
                    phone: request.guest.phone.clone(),
                    check_in: request.stay.start_date,
                    check_out: request.stay.end_date,
                    property_description: request.unit.description(),
                    total_fee: record.amount.major_units(),
                    currency: record.currency.clone(),
                    booking_reference: booking.booking_reference.clone(),
                    payment_reference: record.payment_reference.clone(),
                };
                self.notifier.notify(&summary).await.delivered()
            }
            PaymentRail::Card { .. } => false,
        };

        // Step 10: Respond.
        Ok(OrchestrationResult {
            booking_id: booking.id,
            booking_reference: booking.booking_reference,
            status,
            guest_name: request.guest.full_name(),
            check_in: request.stay.start_date,
            check_out: request.stay.end_date,
            contact_id: contact.id,
            payment_reference: Some(record.payment_reference),
            payment_amount: Some(record.amount.major_units()),
            payment_currency: Some(record.currency),
            invoice_posted,
            webhook_sent,
        })
    }

    /// Legacy flow without payment: contact, booking, and an explicit
    /// ENQUIRY status write the provider expects even though creation
    /// already yields it.
    #[tracing::instrument(skip_all, fields(guest = %request.guest.email))]
    pub async fn create_enquiry(
        &self,
        request: BookingRequest,
    ) -> Result<OrchestrationResult, SagaFailure> {
        metrics::counter!("booking_saga_runs_total").increment(1);

        request
            .guest
            .validate()
            .map_err(|e| SagaFailure::new(e.into()))?;
        request
            .stay
            .validate()
            .map_err(|e| SagaFailure::new(e.into()))?;

        let mut state = RunState::new();

        let contact = self
            .booking_api
            .create_contact(&request.guest)
            .await
            .map_err(|e| state.failure(classify(StepName::EnsureContact, e)))?;
        state.debug.contact_created = true;
        state.debug.contact_id = Some(contact.id);

        let new_booking = NewBooking {
            contact: contact.clone(),
            defaults: self.defaults,
            notes: format!("Web booking for {}", request.guest.full_name()),
            stay: request.stay,
            unit: request.unit.clone(),
        };
        let booking = self
            .booking_api
            .create_booking(&new_booking)
            .await
            .map_err(|e| state.failure(classify(StepName::CreateBooking, e)))?;

        // No money involved, so a failed status write is cosmetic.
        if let Ok(StepOutcome::Completed(room_stay_id)) = settle(
            StepName::AdvanceToPending,
            StepPolicy::Tolerated,
            self.resolve_room_stay(&booking).await,
        ) {
            let written = settle(
                StepName::AdvanceToPending,
                StepPolicy::Tolerated,
                self.booking_api
                    .update_room_stay_status(booking.id, room_stay_id, RoomStayStatus::Enquiry)
                    .await
                    .map_err(|e| classify(StepName::AdvanceToPending, e)),
            );
            // Tolerated steps never abort; settle has already logged.
            debug_assert!(written.is_ok());
        }

        Ok(OrchestrationResult {
            booking_id: booking.id,
            booking_reference: booking.booking_reference,
            status: RoomStayStatus::Enquiry,
            guest_name: request.guest.full_name(),
            check_in: request.stay.start_date,
            check_out: request.stay.end_date,
            contact_id: contact.id,
            payment_reference: None,
            payment_amount: None,
            payment_currency: None,
            invoice_posted: false,
            webhook_sent: false,
        })
    }

    /// Verifies a Stripe payment intent against the requested amount.
    async fn verify_intent(
        &self,
        intent_id: &str,
        payment: &PaymentDetails,
    ) -> Result<PaymentVerification, SagaError> {
        let verification = self
            .gateway
            .verify_payment(intent_id)
            .await
            .map_err(|e| SagaError::PaymentVerification(e.to_string()))?;

        if !verification.succeeded() {
            return Err(SagaError::PaymentVerification(format!(
                "payment intent {intent_id} is '{}', expected 'succeeded'",
                verification.status
            )));
        }
        if !verification
            .currency
            .eq_ignore_ascii_case(&payment.currency)
        {
            return Err(SagaError::PaymentVerification(format!(
                "payment intent {intent_id} is in {}, request is in {}",
                verification.currency, payment.currency
            )));
        }
        let requested = payment.money();
        if verification.amount.abs_diff(requested) > AMOUNT_TOLERANCE_MINOR {
            return Err(SagaError::PaymentVerification(format!(
                "verified amount {} does not match requested amount {}",
                verification.amount, requested
            )));
        }
        Ok(verification)
    }

    /// Resolves the created room stay: the embedded list first, then
    /// the direct lookup, because the provider is inconsistent about
    /// embedding room stays in booking payloads.
    async fn resolve_room_stay(&self, booking: &Booking) -> Result<RoomStayId, SagaError> {
        if let Some(stay) = booking.room_stays.first() {
            return Ok(stay.id);
        }
        let stays = self
            .booking_api
            .room_stays(booking.id)
            .await
            .map_err(|e| classify(StepName::AdvanceToPending, e))?;
        stays.first().map(|stay| stay.id).ok_or_else(|| {
            SagaError::StatusUpdate(format!("booking {} has no room stays", booking.id))
        })
    }

    /// Fetches the booking's invoices and posts every one not already
    /// posted.
    async fn post_pending_invoices(&self, booking: &Booking) -> Result<(), SagaError> {
        let invoices = self
            .booking_api
            .booking_invoices(booking.id)
            .await
            .map_err(|e| classify(StepName::PostInvoices, e))?;
        for invoice in invoices.iter().filter(|invoice| !invoice.posted) {
            self.booking_api
                .post_invoice(invoice.id)
                .await
                .map_err(|e| classify(StepName::PostInvoices, e))?;
            tracing::debug!(invoice_id = %invoice.id, "invoice posted");
        }
        Ok(())
    }
}

/// Builds the payment record for the rail in use: the verified intent
/// on the Stripe rail, a locally classified card capture otherwise.
fn build_payment_record(
    rail: &PaymentRail,
    payment: &PaymentDetails,
    verification: Option<&PaymentVerification>,
) -> PaymentRecord {
    match rail {
        PaymentRail::Stripe { payment_intent_id } => {
            let (amount, currency) = match verification {
                Some(v) => (v.amount, v.currency.clone()),
                None => (payment.money(), payment.currency.to_uppercase()),
            };
            PaymentRecord {
                payment_reference: payment_intent_id.clone(),
                amount,
                currency,
                card_network: None,
                last_four: None,
            }
        }
        PaymentRail::Card { card } => PaymentRecord {
            payment_reference: local_payment_reference(),
            amount: payment.money(),
            currency: payment.currency.to_uppercase(),
            card_network: Some(CardNetwork::classify(&card.normalized_pan())),
            last_four: Some(card.last_four()),
        },
    }
}
