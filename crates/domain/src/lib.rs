//! Domain entities for the short-stay booking flow.
//!
//! These types describe one orchestration run: who is staying
//! ([`GuestDetails`]), when ([`StayDetails`]), where ([`UnitSelection`])
//! and how it is paid for ([`PaymentDetails`]). None of them persist
//! locally; the external booking provider is the system of record.

pub mod error;
pub mod guest;
pub mod payment;
pub mod status;
pub mod stay;
pub mod unit;

pub use error::ValidationError;
pub use guest::GuestDetails;
pub use payment::{CardDetails, CardNetwork, PaymentDetails, PaymentRail, local_payment_reference};
pub use status::RoomStayStatus;
pub use stay::StayDetails;
pub use unit::UnitSelection;
