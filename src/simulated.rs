//! # Simulated Position Provider
//!
//! A stand-in for the platform location service, used by the development
//! binary and by tests. It behaves like a real provider from the session's
//! point of view: it can deny permission, fail to subscribe, and fan fixes out
//! to every live subscription.
//!
//! ## Behaviour
//! - **Permission**: granted by default, toggled with [`SimulatedProvider::set_permission`]
//! - **Availability**: [`SimulatedProvider::set_available`] makes `subscribe`
//!   and `current_position` fail with `ProviderUnavailable`
//! - **Displacement**: each subscription skips fixes closer than its
//!   `min_displacement` to the last fix it was sent
//! - **Interval**: not enforced; the cadence is whatever the caller pushes at
//!   (see [`SimulatedProvider::replay`])
//!
//! ## Route Files
//! [`parse_route`] reads one `lat,lon` pair per line. Blank lines and lines
//! starting with `#` are skipped.

use crate::error::AlarmError;
use crate::provider::{PositionProvider, SubscriptionHandle, SubscriptionOptions, UpdateSender};
use crate::Coordinate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

struct Subscriber {
    options: SubscriptionOptions,
    updates: UpdateSender,
    last_sent: Option<Coordinate>,
}

pub struct SimulatedProvider {
    permission: AtomicBool,
    available: AtomicBool,
    next_handle: AtomicU64,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    last_fix: Mutex<Option<Coordinate>>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    pub fn new() -> Self {
        SimulatedProvider {
            permission: AtomicBool::new(true),
            available: AtomicBool::new(true),
            next_handle: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
            last_fix: Mutex::new(None),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Report a new fix. Returns how many subscriptions it was delivered to.
    pub fn push(&self, at: Coordinate) -> usize {
        *self.last_fix.lock().unwrap_or_else(|e| e.into_inner()) = Some(at);

        let mut delivered = 0;
        self.subscribers().retain(|handle, sub| {
            if let Some(last) = sub.last_sent {
                if last.distance_to(at) < sub.options.min_displacement.to_kilometers() {
                    debug!(subscription = *handle, "fix within min displacement, skipped");
                    return true;
                }
            }
            if sub.updates.send(at).is_err() {
                debug!(subscription = *handle, "receiver gone, dropping subscription");
                return false;
            }
            sub.last_sent = Some(at);
            delivered += 1;
            true
        });
        delivered
    }

    /// Push each point of `route`, sleeping `step` between points.
    ///
    /// Returns the total number of deliveries across all subscriptions.
    pub async fn replay(&self, route: &[Coordinate], step: Duration) -> usize {
        let mut delivered = 0;
        for (i, at) in route.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(step).await;
            }
            delivered += self.push(*at);
        }
        delivered
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers().len()
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_available(&self) -> Result<(), AlarmError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AlarmError::ProviderUnavailable(
                "simulated provider switched off".to_string(),
            ))
        }
    }
}

impl PositionProvider for SimulatedProvider {
    fn request_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn current_position(&self) -> Result<Coordinate, AlarmError> {
        self.ensure_available()?;
        let last = *self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        last.ok_or_else(|| AlarmError::ProviderUnavailable("no fix yet".to_string()))
    }

    fn subscribe(
        &self,
        options: SubscriptionOptions,
        updates: UpdateSender,
    ) -> Result<SubscriptionHandle, AlarmError> {
        self.ensure_available()?;
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.subscribers().insert(
            id,
            Subscriber {
                options,
                updates,
                last_sent: None,
            },
        );
        Ok(SubscriptionHandle(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers().remove(&handle.0);
    }
}

/// Parse a route file into coordinates.
pub fn parse_route(text: &str) -> Result<Vec<Coordinate>, AlarmError> {
    let mut route = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let bad = |reason: &str| AlarmError::Route {
            line: index + 1,
            reason: reason.to_string(),
        };

        let (lat, lon) = line.split_once(',').ok_or_else(|| bad("expected `lat,lon`"))?;
        let latitude: f64 = lat.trim().parse().map_err(|_| bad("latitude is not a number"))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|_| bad("longitude is not a number"))?;

        let at = Coordinate::new(latitude, longitude);
        if !at.is_valid() {
            return Err(bad("coordinate out of range"));
        }
        route.push(at);
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::update_channel;
    use crate::units::Meters;

    #[test]
    fn test_push_respects_min_displacement() {
        let provider = SimulatedProvider::new();
        let (tx, mut rx) = update_channel();
        provider
            .subscribe(
                SubscriptionOptions {
                    min_interval: Duration::ZERO,
                    min_displacement: Meters(10.0),
                },
                tx,
            )
            .unwrap();

        assert_eq!(provider.push(Coordinate::new(40.0, -73.0)), 1);
        // ~5.5 m further north: below the threshold
        assert_eq!(provider.push(Coordinate::new(40.00005, -73.0)), 0);
        // ~55 m: delivered
        assert_eq!(provider.push(Coordinate::new(40.0005, -73.0)), 1);

        assert_eq!(rx.try_recv().unwrap(), Coordinate::new(40.0, -73.0));
        assert_eq!(rx.try_recv().unwrap(), Coordinate::new(40.0005, -73.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receiver_drops_subscription() {
        let provider = SimulatedProvider::new();
        let (tx, rx) = update_channel();
        provider.subscribe(SubscriptionOptions::default(), tx).unwrap();
        drop(rx);

        assert_eq!(provider.push(Coordinate::new(0.0, 0.0)), 0);
        assert_eq!(provider.active_subscriptions(), 0);
    }

    #[test]
    fn test_current_position_tracks_last_push() {
        let provider = SimulatedProvider::new();
        assert!(matches!(
            provider.current_position(),
            Err(AlarmError::ProviderUnavailable(_))
        ));
        provider.push(Coordinate::new(1.0, 2.0));
        assert_eq!(provider.current_position().unwrap(), Coordinate::new(1.0, 2.0));

        provider.set_available(false);
        assert!(provider.current_position().is_err());
    }

    #[test]
    fn test_parse_route() {
        let text = "# commute\n40.01, -73.0\n\n40.0005,-73.0\n";
        let route = parse_route(text).unwrap();
        assert_eq!(
            route,
            vec![Coordinate::new(40.01, -73.0), Coordinate::new(40.0005, -73.0)]
        );
    }

    #[test]
    fn test_parse_route_reports_line_numbers() {
        let err = parse_route("1,1\nnot a point\n").unwrap_err();
        assert!(matches!(err, AlarmError::Route { line: 2, .. }));

        let err = parse_route("95.0,0.0").unwrap_err();
        assert!(matches!(err, AlarmError::Route { line: 1, .. }));
    }

    #[tokio::test]
    async fn test_replay_delivers_every_point() {
        let provider = SimulatedProvider::new();
        let (tx, mut rx) = update_channel();
        provider.subscribe(SubscriptionOptions::default(), tx).unwrap();

        let route = [
            Coordinate::new(40.01, -73.0),
            Coordinate::new(40.0005, -73.0),
            Coordinate::new(40.0, -73.0),
        ];
        let delivered = provider.replay(&route, Duration::from_millis(1)).await;
        assert_eq!(delivered, 3);
        for expected in route {
            assert_eq!(rx.recv().await, Some(expected));
        }
    }
}
