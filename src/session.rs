//! # Location Tracking Session
//!
//! Owns the single live subscription to a [`PositionProvider`] and fans each
//! fix out to the caller's display callback and the geofence monitor.
//!
//! ## Lifecycle
//! - [`TrackingSession::start`] tears down any previous subscription before
//!   opening a new one, so there is never more than one live stream
//! - [`TrackingSession::stop`] is idempotent and is also run on drop
//! - [`TrackingSession::drain`] closes the subscription but lets every fix
//!   already handed over by the provider run through the callbacks first
//! - Failures (no runtime, permission denied, provider error) are logged and
//!   reported as `false`; nothing is propagated and nothing panics
//!
//! ## Ordering
//! One delivery task drains the update channel. For every fix it runs, in
//! order and without yielding in between:
//! 1. the display callback
//! 2. zone evaluation on the shared monitor
//! 3. the trigger callback, once per zone that just fired
//!
//! ## Stopping
//! After `stop` returns no new fix is dispatched. A fix whose callbacks were
//! already running on the delivery task when `stop` was called from another
//! thread is allowed to finish; that single in-flight update is the only
//! window in which a callback can still run.

use crate::error::AlarmError;
use crate::monitor::{self, SharedMonitor};
use crate::provider::{
    update_channel, PositionProvider, SubscriptionHandle, SubscriptionOptions, UpdateReceiver,
};
use crate::zone::Zone;
use crate::Coordinate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Bookkeeping for the one live subscription.
struct ActiveSubscription {
    handle: SubscriptionHandle,
    live: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

pub struct TrackingSession<P: PositionProvider> {
    provider: Arc<P>,
    monitor: SharedMonitor,
    options: SubscriptionOptions,
    active: Option<ActiveSubscription>,
}

impl<P: PositionProvider> TrackingSession<P> {
    pub fn new(provider: Arc<P>, monitor: SharedMonitor) -> Self {
        TrackingSession {
            provider,
            monitor,
            options: SubscriptionOptions::default(),
            active: None,
        }
    }

    /// Override the debouncing parameters used for future subscriptions.
    pub fn with_options(mut self, options: SubscriptionOptions) -> Self {
        self.options = options;
        self
    }

    /// Start tracking. Returns `false` if tracking could not be started.
    ///
    /// Must be called from within a tokio runtime; the delivery task is
    /// spawned onto it.
    pub fn start<U, T>(&mut self, on_update: U, on_trigger: T) -> bool
    where
        U: FnMut(Coordinate) + Send + 'static,
        T: FnMut(&Zone) + Send + 'static,
    {
        self.stop();

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let error = AlarmError::ProviderUnavailable(e.to_string());
                warn!(%error, "cannot start tracking outside a tokio runtime");
                return false;
            }
        };

        if !self.provider.request_permission() {
            warn!(error = %AlarmError::PermissionDenied, "tracking not started");
            return false;
        }

        let (updates_tx, updates_rx) = update_channel();
        let handle = match self.provider.subscribe(self.options, updates_tx) {
            Ok(handle) => handle,
            Err(error) => {
                warn!(%error, "location subscription failed");
                return false;
            }
        };

        let live = Arc::new(AtomicBool::new(true));
        let task = runtime.spawn(deliver(
            updates_rx,
            Arc::clone(&self.monitor),
            Arc::clone(&live),
            on_update,
            on_trigger,
        ));

        info!(
            subscription = handle.0,
            min_interval = ?self.options.min_interval,
            min_displacement = %self.options.min_displacement,
            "tracking started"
        );
        self.active = Some(ActiveSubscription { handle, live, task });
        true
    }

    /// [`start`](Self::start) without a display callback.
    pub fn start_monitoring<T>(&mut self, on_trigger: T) -> bool
    where
        T: FnMut(&Zone) + Send + 'static,
    {
        self.start(|_| {}, on_trigger)
    }

    /// Release the subscription if there is one.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.live.store(false, Ordering::Release);
        self.provider.unsubscribe(active.handle);
        active.task.abort();
        info!(subscription = active.handle.0, "tracking stopped");
    }

    /// Close the subscription and wait for the delivery task to finish the
    /// fixes that were already queued.
    ///
    /// Relies on the provider dropping the subscription's sender on
    /// [`unsubscribe`](PositionProvider::unsubscribe); the task then sees the
    /// channel close once the backlog is empty.
    pub async fn drain(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.provider.unsubscribe(active.handle);
        if let Err(error) = active.task.await {
            if !error.is_cancelled() {
                warn!(%error, "delivery task ended abnormally");
            }
        }
        active.live.store(false, Ordering::Release);
        info!(subscription = active.handle.0, "tracking drained");
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn monitor(&self) -> &SharedMonitor {
        &self.monitor
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

impl<P: PositionProvider> Drop for TrackingSession<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drain the update channel until it closes or the session is stopped.
async fn deliver<U, T>(
    mut updates: UpdateReceiver,
    monitor: SharedMonitor,
    live: Arc<AtomicBool>,
    mut on_update: U,
    mut on_trigger: T,
) where
    U: FnMut(Coordinate) + Send + 'static,
    T: FnMut(&Zone) + Send + 'static,
{
    while let Some(at) = updates.recv().await {
        if !live.load(Ordering::Acquire) {
            break;
        }
        debug!(position = %at, "position update");
        on_update(at);

        let fired = monitor::lock(&monitor).evaluate(at);
        for zone in &fired {
            on_trigger(zone);
        }
    }
    debug!("update channel closed");
}
