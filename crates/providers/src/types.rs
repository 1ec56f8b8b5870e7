//! Provider-facing entities exchanged with the booking API.
//!
//! These are the narrow, already-decoded shapes the rest of the system
//! sees. The raw wire DTOs live next to the reqwest client so provider
//! schema churn stays inside this crate.

use common::{BookingId, ContactId, InventoryTypeId, InvoiceId, Money, RateId, RoomStayId};
use domain::{CardNetwork, RoomStayStatus, StayDetails, UnitSelection};
use serde::{Deserialize, Serialize};

/// A guest contact as known by the booking provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    /// Finance account attached to the contact, when the provider
    /// exposes one. Falls back to the contact id in booking payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_account_id: Option<i64>,
}

impl Contact {
    /// The id to use for booking/billing finance-account fields.
    pub fn finance_account(&self) -> i64 {
        self.finance_account_id.unwrap_or_else(|| self.id.value())
    }
}

/// A single date-ranged occupancy line within a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStay {
    pub id: RoomStayId,
    #[serde(default)]
    pub status: RoomStayStatus,
}

/// A booking held by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub booking_reference: String,
    /// The provider is inconsistent about embedding room stays; an
    /// empty list here does not mean the booking has none.
    #[serde(default)]
    pub room_stays: Vec<RoomStay>,
}

/// An invoice attached to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub posted: bool,
}

/// A payment recorded (or to be recorded) against a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Unique per attempt: the payment-intent id on the Stripe rail, a
    /// locally generated `PAY-...` reference on the card rail.
    pub payment_reference: String,
    pub amount: Money,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_network: Option<CardNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four: Option<String>,
}

/// Fixed booking-level ids the provider requires on every create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingDefaults {
    pub billing_frequency_id: i64,
    pub booking_type_id: i64,
    pub channel_id: i64,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self {
            billing_frequency_id: 1,
            booking_type_id: 1,
            channel_id: 1,
        }
    }
}

/// Everything needed to create a booking with one room stay.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub contact: Contact,
    pub defaults: BookingDefaults,
    pub notes: String,
    pub stay: StayDetails,
    pub unit: UnitSelection,
}

/// Date range and occupancy for an availability search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub guests: u32,
}

/// One priced offer for a unit type and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOffer {
    pub rate_id: RateId,
    pub rate_code: String,
    pub rate_name: String,
    pub currency: String,
    pub total_price: f64,
    pub avg_nightly_rate: f64,
    pub nights: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A bookable building, as listed to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_code: Option<String>,
}

/// Availability of one unit type in one building, with its rate offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAvailability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    pub inventory_type_id: InventoryTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_type_name: Option<String>,
    pub rates: Vec<RateOffer>,
}
