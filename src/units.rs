//! # Distance Units
//!
//! Radii are configured in meters while great-circle distances come out of
//! the haversine formula in kilometers. Both are wrapped in their own type so
//! a meter value can never be compared against a kilometer value without an
//! explicit conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A length in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// A length in kilometers.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilometers(pub f64);

impl Meters {
    pub const fn new(value: f64) -> Self {
        Meters(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn to_kilometers(self) -> Kilometers {
        Kilometers(self.0 / 1000.0)
    }

    /// Radii must be finite and strictly positive.
    pub fn is_positive(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl Kilometers {
    pub const fn new(value: f64) -> Self {
        Kilometers(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn to_meters(self) -> Meters {
        Meters(self.0 * 1000.0)
    }
}

impl From<Meters> for Kilometers {
    fn from(m: Meters) -> Self {
        m.to_kilometers()
    }
}

impl From<Kilometers> for Meters {
    fn from(km: Kilometers) -> Self {
        km.to_meters()
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} m", self.0)
    }
}

impl fmt::Display for Kilometers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} km", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Meters(1500.0).to_kilometers(), Kilometers(1.5));
        assert_eq!(Meters::from(Kilometers(0.1)), Meters(100.0));
        assert!(Kilometers::from(Meters(99.0)) < Kilometers(0.1));
    }

    #[test]
    fn test_positive_radius() {
        assert!(Meters(0.5).is_positive());
        assert!(!Meters(0.0).is_positive());
        assert!(!Meters(-3.0).is_positive());
        assert!(!Meters(f64::INFINITY).is_positive());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Meters(250.0)).unwrap();
        assert_eq!(json, "250.0");
    }
}
