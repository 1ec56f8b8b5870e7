//! Room stay status progression.

use serde::{Deserialize, Serialize};

/// Status of a room stay within a booking.
///
/// Progression enforced by the provider:
/// ```text
/// ENQUIRY ──► PENDING ──► CONFIRMED
/// ```
/// Creation always yields `ENQUIRY`; every later transition is an
/// explicit status-update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStayStatus {
    /// Initial state assigned by the provider on creation.
    #[default]
    Enquiry,

    /// Held while payment is being recorded.
    Pending,

    /// Terminal state for a paid booking.
    Confirmed,
}

impl RoomStayStatus {
    /// Returns the provider's wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStayStatus::Enquiry => "ENQUIRY",
            RoomStayStatus::Pending => "PENDING",
            RoomStayStatus::Confirmed => "CONFIRMED",
        }
    }

    /// Returns the lowercase form used in frontend responses.
    pub fn as_response_str(&self) -> &'static str {
        match self {
            RoomStayStatus::Enquiry => "enquiry",
            RoomStayStatus::Pending => "pending",
            RoomStayStatus::Confirmed => "confirmed",
        }
    }

    /// Returns true if `next` is the immediate successor of this status.
    pub fn can_advance_to(&self, next: RoomStayStatus) -> bool {
        matches!(
            (self, next),
            (RoomStayStatus::Enquiry, RoomStayStatus::Pending)
                | (RoomStayStatus::Pending, RoomStayStatus::Confirmed)
        )
    }
}

impl std::fmt::Display for RoomStayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
