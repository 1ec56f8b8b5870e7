//! Orchestration layer: the booking-with-payment saga and the
//! availability fan-out.
//!
//! Everything here is provider-agnostic; external systems come in
//! through the trait objects defined in the `providers` crate, which is
//! also what makes the whole layer testable in memory.

pub mod availability;
pub mod coordinator;
pub mod error;
pub mod result;
pub mod step;

pub use availability::{AvailabilitySearch, MergedAvailability};
pub use coordinator::{BookingRequest, BookingSaga};
pub use error::SagaError;
pub use result::{OrchestrationResult, SagaDebug, SagaFailure};
pub use step::{RailPolicy, StepName, StepOutcome, StepPolicy};
