use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw provider identifier.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier value.
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier of a contact (guest) in the booking provider.
    ///
    /// Wraps the provider's numeric id to prevent mixing it up with
    /// other numeric identifiers flowing through the saga.
    ContactId
);

numeric_id!(
    /// Identifier of a booking in the booking provider.
    BookingId
);

numeric_id!(
    /// Identifier of a single room stay line within a booking.
    RoomStayId
);

numeric_id!(
    /// Identifier of an invoice attached to a booking.
    InvoiceId
);

numeric_id!(
    /// Identifier of a priced rate offer, produced by availability search.
    RateId
);

numeric_id!(
    /// Identifier of a bookable unit type, produced by availability search.
    InventoryTypeId
);
