//! # Alarm Zones
//!
//! A zone is a circle around a destination. It is armed when registered and
//! goes `untriggered → triggered` exactly once, the first time a position
//! update lands inside it. There is no way back: re-arming means removing the
//! zone and registering it again.

use crate::units::{Kilometers, Meters};
use crate::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque zone identifier. Uniqueness is the only property callers may rely on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        ZoneId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        ZoneId(s.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        ZoneId(s)
    }
}

/// A registered zone as held by the monitor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub center: Coordinate,
    pub radius: Meters,
    /// Set once by the monitor on the first in-range observation
    pub triggered: bool,
    pub name: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Zone {
    /// Distance from the center to `at` when `at` lies inside (or exactly on)
    /// the boundary, `None` otherwise.
    pub fn distance_if_inside(&self, at: Coordinate) -> Option<Kilometers> {
        let distance = self.center.distance_to(at);
        (distance <= self.radius.to_kilometers()).then_some(distance)
    }

    /// Whether `at` lies inside (or exactly on) this zone's boundary.
    pub fn contains(&self, at: Coordinate) -> bool {
        self.distance_if_inside(at).is_some()
    }

    /// Name if one was given, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Registration request for a zone. Leave `id` empty to have one generated.
///
/// # Example
/// ```
/// use arrival_alarm_lib::{Coordinate, Meters, NewZone};
///
/// let stop = NewZone::new(Coordinate::new(40.0, -73.0), Meters(100.0))
///     .with_name("Home");
/// assert!(stop.id.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    pub id: Option<ZoneId>,
    pub center: Coordinate,
    pub radius: Meters,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl NewZone {
    pub fn new(center: Coordinate, radius: Meters) -> Self {
        NewZone {
            id: None,
            center,
            radius,
            name: None,
            address: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ZoneId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
