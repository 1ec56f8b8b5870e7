//! External provider clients for the booking backend.
//!
//! This crate is the system's true external boundary: the booking
//! provider (contacts, bookings, room stays, invoices, payments,
//! availability), the payment gateway (payment intents) and the
//! completion webhook. Wire shapes are provider-owned contracts and
//! stay inside this crate; everything above sees the narrow traits.

pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod notify;
pub mod payment;
pub mod types;

pub use auth::TokenSource;
pub use booking::{BookingApi, InMemoryBookingApi, ResHarmonicsClient};
pub use config::{BookingProviderConfig, StripeConfig, WebhookConfig};
pub use error::{GatewayError, ProviderError};
pub use notify::{
    BookingSummary, DisabledNotifier, NotificationSink, NotifyOutcome, RecordingNotifier,
    WebhookNotifier,
};
pub use payment::{
    InMemoryPaymentGateway, PaymentGateway, PaymentIntent, PaymentVerification, Refund,
    StripeGateway,
};
pub use types::{
    AvailabilityQuery, Booking, BookingDefaults, Building, Contact, Invoice, NewBooking,
    PaymentRecord, PropertyAvailability, RateOffer, RoomStay,
};
