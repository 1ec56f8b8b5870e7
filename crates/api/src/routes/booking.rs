//! Booking creation and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::BookingId;
use domain::{GuestDetails, PaymentDetails, StayDetails, UnitSelection};
use providers::{BookingApi, PaymentGateway};
use saga::{AvailabilitySearch, BookingRequest, BookingSaga};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: BookingSaga,
    pub availability: AvailabilitySearch,
    pub booking_api: Arc<dyn BookingApi>,
    pub gateway: Arc<dyn PaymentGateway>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub guest_details: GuestDetails,
    pub stay_details: StayDetails,
    pub unit_details: UnitSelection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithPaymentRequest {
    pub guest_details: GuestDetails,
    pub stay_details: StayDetails,
    pub unit_details: UnitSelection,
    pub payment_details: PaymentDetails,
    /// Presence selects the Stripe rail; absence the legacy card rail.
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
}

impl CreateBookingRequest {
    fn into_booking_request(self) -> BookingRequest {
        BookingRequest {
            guest: self.guest_details,
            stay: self.stay_details,
            unit: self.unit_details,
        }
    }
}

// -- Handlers --

/// POST /booking/create — legacy enquiry flow, no payment.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let result = state.saga.create_enquiry(req.into_booking_request()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": result })),
    ))
}

/// POST /booking/create-with-payment — full orchestration run.
#[tracing::instrument(skip_all)]
pub async fn create_with_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWithPaymentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let request = BookingRequest {
        guest: req.guest_details,
        stay: req.stay_details,
        unit: req.unit_details,
    };
    let result = state
        .saga
        .create_with_payment(request, req.payment_details, req.stripe_payment_intent_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": result })),
    ))
}

/// GET /booking/{id} — pass-through read of one booking.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.booking_api.booking(booking_id).await?;
    Ok(Json(json!({ "success": true, "data": booking })))
}

/// GET /booking/{id}/payments — payments recorded against a booking.
#[tracing::instrument(skip(state))]
pub async fn payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let payments = state.booking_api.booking_payments(booking_id).await?;
    let total = payments.len();
    Ok(Json(json!({
        "success": true,
        "data": payments,
        "total": total,
    })))
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    id.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(BookingId::new)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid booking id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_ids_must_be_positive_integers() {
        assert!(parse_booking_id("1001").is_ok());
        assert!(parse_booking_id("abc").is_err());
        assert!(parse_booking_id("-4").is_err());
        assert!(parse_booking_id("0").is_err());
    }
}
