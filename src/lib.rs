//! # Arrival Alarm Core Library
//!
//! This library provides the geofence engine behind a "wake me when I arrive"
//! alarm: the user picks a destination, the device keeps reporting its
//! position, and an alert fires the first time the device enters a circle
//! around that destination.
//!
//! ## Design Philosophy
//!
//! ### One Stream, One Pass
//! - **Single subscription**: a [`session::TrackingSession`] owns at most one live
//!   subscription to a [`provider::PositionProvider`]
//! - **In-order delivery**: the provider pushes each fix onto a channel and one
//!   delivery task forwards it to the display callback and then to the
//!   [`monitor::GeofenceMonitor`], never reordering or buffering
//! - **Edge-triggered zones**: each zone fires exactly once on its
//!   `untriggered → triggered` transition
//!
//! ### Explicit Units
//! Distances are [`units::Kilometers`], radii are [`units::Meters`]. The
//! comparison between the two always goes through an explicit conversion.
//!
//! ### Data Flow
//! 1. **Provider**: platform location service (or [`simulated::SimulatedProvider`])
//! 2. **Session**: display callback → zone evaluation → trigger callback
//! 3. **Monitor**: haversine distance per untriggered zone
//!
//! ## Core Types
//!
//! The library exports one primary value type:
//! - [`Coordinate`]: a WGS-84 latitude/longitude pair in degrees

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod distance;
pub mod error;
pub mod geocode;
pub mod logging;
pub mod monitor;
pub mod provider;
pub mod session;
pub mod simulated;
pub mod store;
pub mod units;
pub mod zone;

pub use error::AlarmError;
pub use monitor::{GeofenceMonitor, SharedMonitor};
pub use session::TrackingSession;
pub use units::{Kilometers, Meters};
pub use zone::{NewZone, Zone, ZoneId};

/// A position on the WGS-84 ellipsoid, in degrees.
///
/// No datum conversion is ever applied; whatever the provider reports is
/// taken as WGS-84.
///
/// # Example
/// ```
/// use arrival_alarm_lib::Coordinate;
///
/// let grand_central = Coordinate::new(40.7527, -73.9772);
/// assert!(grand_central.is_valid());
///
/// let nowhere = Coordinate::new(91.0, 0.0);
/// assert!(!nowhere.is_valid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to +90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to +180)
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// True if both components are finite and inside their degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other`.
    ///
    /// ```
    /// use arrival_alarm_lib::Coordinate;
    ///
    /// let a = Coordinate::new(0.0, 0.0);
    /// let b = Coordinate::new(0.0, 1.0);
    /// assert!((a.distance_to(b).value() - 111.19).abs() < 0.5);
    /// ```
    pub fn distance_to(&self, other: Coordinate) -> Kilometers {
        distance::haversine(*self, other)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(40.0, -73.5);
        assert_eq!(c.to_string(), "40.000000, -73.500000");
    }
}
