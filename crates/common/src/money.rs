use serde::{Deserialize, Serialize};

/// Money amount in currency minor units (e.g. öre, cents) to avoid
/// floating point drift inside the saga.
///
/// Wire formats on both sides disagree: the frontend and the booking
/// provider speak major units (`500.00`), the payment provider speaks
/// minor units (`50000`). Conversions happen at the edges via
/// [`Money::from_major`] and [`Money::major_units`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from a major-unit value, rounding to the
    /// nearest minor unit.
    pub fn from_major(major: f64) -> Self {
        Self((major * 100.0).round() as i64)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a major-unit value.
    pub fn major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Absolute difference against another amount, in minor units.
    pub fn abs_diff(&self, other: Money) -> i64 {
        (self.0 - other.0).abs()
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_rounds_to_nearest_minor_unit() {
        assert_eq!(Money::from_major(500.00).minor_units(), 50000);
        assert_eq!(Money::from_major(100.005).minor_units(), 10001);
        assert_eq!(Money::from_major(0.1 + 0.2).minor_units(), 30);
    }

    #[test]
    fn major_units_roundtrip() {
        let m = Money::from_minor(10050);
        assert!((m.major_units() - 100.50).abs() < f64::EPSILON);
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Money::from_major(100.00);
        let b = Money::from_major(100.02);
        assert_eq!(a.abs_diff(b), 2);
        assert_eq!(b.abs_diff(a), 2);
    }

    #[test]
    fn display_formats_major_units() {
        assert_eq!(Money::from_minor(50000).to_string(), "500.00");
        assert_eq!(Money::from_minor(-105).to_string(), "-1.05");
        assert_eq!(Money::from_minor(7).to_string(), "0.07");
    }
}
