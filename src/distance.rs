//! # Great-Circle Distance
//!
//! All distance math in the crate goes through [`haversine`]. It works on a
//! spherical Earth of radius 6371 km in `f64`, which keeps arrival detection
//! within meter-scale accuracy at any latitude. A flat-earth shortcut is never
//! used, not even for small radii.

use crate::units::Kilometers;
use crate::Coordinate;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates given in degrees.
///
/// ```text
/// a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)
/// c = 2·atan2(√a, √(1−a))
/// d = R·c
/// ```
pub fn haversine(from: Coordinate, to: Coordinate) -> Kilometers {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can leave `a` a hair outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Kilometers(EARTH_RADIUS_KM * c)
}
