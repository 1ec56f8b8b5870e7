//! Shared types for the booking backend.
//!
//! Everything here is transient: the system of record for contacts,
//! bookings, room stays and invoices is the external booking provider,
//! so these types only wrap the identifiers and amounts it hands back.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{BookingId, ContactId, InventoryTypeId, InvoiceId, RateId, RoomStayId};
