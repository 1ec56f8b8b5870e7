use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Date range and occupancy for a single room stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayDetails {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of adults; the provider requires at least one.
    #[serde(alias = "guests")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl StayDetails {
    /// Number of nights covered by the stay.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Checks date ordering and guest counts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_date <= self.start_date {
            return Err(ValidationError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.adults == 0 {
            return Err(ValidationError::InvalidGuestCount(
                "at least one adult is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn stay() -> StayDetails {
        StayDetails {
            start_date: date("2026-09-01"),
            end_date: date("2026-09-05"),
            adults: 2,
            children: 0,
            infants: 0,
        }
    }

    #[test]
    fn nights_counts_date_difference() {
        assert_eq!(stay().nights(), 4);
    }

    #[test]
    fn validate_rejects_reversed_dates() {
        let mut s = stay();
        s.end_date = date("2026-09-01");
        assert!(matches!(
            s.validate(),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn validate_requires_an_adult() {
        let mut s = stay();
        s.adults = 0;
        assert!(matches!(
            s.validate(),
            Err(ValidationError::InvalidGuestCount(_))
        ));
    }

    #[test]
    fn guests_alias_maps_to_adults() {
        let s: StayDetails = serde_json::from_str(
            r#"{"startDate":"2026-09-01","endDate":"2026-09-03","guests":3}"#,
        )
        .unwrap();
        assert_eq!(s.adults, 3);
        assert_eq!(s.children, 0);
    }
}
