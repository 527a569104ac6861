//! # Geofence Monitor
//!
//! Holds the set of armed zones and performs edge-triggered arrival
//! detection against each incoming position.
//!
//! ## Evaluation Rules
//! - Only zones with `triggered == false` are checked
//! - A zone triggers when `haversine(position, center) <= radius`
//! - Triggering flips the flag and reports the zone exactly once
//! - Zones are independent, so evaluation order never changes the outcome
//!
//! ## Sharing
//! Screens mutate the zone set while the tracking session evaluates it from
//! its delivery task. Both go through a [`SharedMonitor`]; the flag flip
//! happens under that lock, so a zone cannot fire twice even if two updates
//! race.

use crate::error::AlarmError;
use crate::zone::{NewZone, Zone, ZoneId};
use crate::Coordinate;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Handle to a monitor shared between callers and a tracking session.
pub type SharedMonitor = Arc<Mutex<GeofenceMonitor>>;

/// Lock a shared monitor, recovering the data if a previous holder panicked.
pub fn lock(monitor: &SharedMonitor) -> MutexGuard<'_, GeofenceMonitor> {
    monitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct GeofenceMonitor {
    zones: Vec<Zone>,
    /// Disambiguates ids generated within the same millisecond
    next_seq: u64,
}

impl GeofenceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an empty monitor already wrapped for sharing.
    pub fn shared() -> SharedMonitor {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Register a zone and return its id.
    ///
    /// The zone starts untriggered. A missing id is generated; an explicit id
    /// that is already registered replaces that zone, which re-arms it.
    pub fn add_zone(&mut self, request: NewZone) -> Result<ZoneId, AlarmError> {
        if !request.center.is_valid() {
            return Err(AlarmError::InvalidZone(format!(
                "center {} is out of range",
                request.center
            )));
        }
        if !request.radius.is_positive() {
            return Err(AlarmError::InvalidZone(format!(
                "radius must be positive, got {}",
                request.radius.value()
            )));
        }

        let id = match request.id {
            Some(id) => id,
            None => self.generate_id(),
        };

        let zone = Zone {
            id: id.clone(),
            center: request.center,
            radius: request.radius,
            triggered: false,
            name: request.name,
            address: request.address,
            created_at: Utc::now(),
        };

        if let Some(existing) = self.zones.iter_mut().find(|z| z.id == id) {
            debug!(zone = %id, "replacing existing zone");
            *existing = zone;
        } else {
            info!(zone = %id, center = %zone.center, radius = %zone.radius, "zone armed");
            self.zones.push(zone);
        }

        Ok(id)
    }

    /// Remove a zone. Unknown ids are ignored.
    pub fn remove_zone(&mut self, id: &ZoneId) -> Option<Zone> {
        let index = self.zones.iter().position(|z| &z.id == id)?;
        debug!(zone = %id, "zone removed");
        Some(self.zones.swap_remove(index))
    }

    pub fn clear_zones(&mut self) {
        debug!(count = self.zones.len(), "clearing all zones");
        self.zones.clear();
    }

    /// Check every armed zone against `at` and return the ones that just fired.
    ///
    /// Each returned zone is a snapshot taken after its flag was set, so
    /// `zone.triggered` is always `true` in the result.
    pub fn evaluate(&mut self, at: Coordinate) -> Vec<Zone> {
        let mut fired = Vec::new();
        self.evaluate_with(at, |zone| fired.push(zone.clone()));
        fired
    }

    /// Like [`evaluate`](Self::evaluate) but hands each newly triggered zone
    /// to `on_trigger` instead of collecting them.
    pub fn evaluate_with<F>(&mut self, at: Coordinate, mut on_trigger: F) -> usize
    where
        F: FnMut(&Zone),
    {
        let mut count = 0;
        for zone in self.zones.iter_mut().filter(|z| !z.triggered) {
            if let Some(distance) = zone.distance_if_inside(at) {
                zone.triggered = true;
                count += 1;
                info!(
                    zone = %zone.id,
                    label = zone.label(),
                    distance = %distance.to_meters(),
                    "arrived inside zone"
                );
                on_trigger(&*zone);
            }
        }
        count
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Number of zones that have not fired yet.
    pub fn pending(&self) -> usize {
        self.zones.iter().filter(|z| !z.triggered).count()
    }

    fn generate_id(&mut self) -> ZoneId {
        loop {
            let candidate = ZoneId::new(format!(
                "{}-{}",
                Utc::now().timestamp_millis(),
                self.next_seq
            ));
            self.next_seq += 1;
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
