//! # Position Provider Contract
//!
//! The platform location service sits behind [`PositionProvider`]. The core
//! never talks to GPS hardware directly; it asks for permission, opens one
//! subscription, and receives fixes on a channel.
//!
//! ## Delivery
//! A subscription is handed an [`UpdateSender`]. The provider pushes every fix
//! it decides to report onto that sender, in the order it observed them. When
//! the receiving side is gone the send fails, which the provider may treat as
//! an implicit unsubscribe.
//!
//! ## Debouncing
//! [`SubscriptionOptions`] carries the minimum interval and displacement the
//! provider should apply before reporting a new fix. They only bound update
//! frequency; arrival detection stays correct under any tighter policy.

use crate::error::AlarmError;
use crate::units::Meters;
use crate::Coordinate;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sending half of a subscription's update channel.
pub type UpdateSender = mpsc::UnboundedSender<Coordinate>;

/// Receiving half of a subscription's update channel.
pub type UpdateReceiver = mpsc::UnboundedReceiver<Coordinate>;

/// Default minimum time between reported fixes
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Default minimum movement between reported fixes
pub const DEFAULT_MIN_DISPLACEMENT: Meters = Meters(10.0);

/// Debouncing parameters passed to [`PositionProvider::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubscriptionOptions {
    pub min_interval: Duration,
    pub min_displacement: Meters,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        SubscriptionOptions {
            min_interval: DEFAULT_MIN_INTERVAL,
            min_displacement: DEFAULT_MIN_DISPLACEMENT,
        }
    }
}

/// Token identifying one live subscription on a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// What the core needs from a platform location service.
pub trait PositionProvider: Send + Sync + 'static {
    /// Ask for runtime location access. `false` means denied.
    fn request_permission(&self) -> bool;

    /// One-shot position fix.
    fn current_position(&self) -> Result<Coordinate, AlarmError>;

    /// Start pushing fixes onto `updates` until [`unsubscribe`](Self::unsubscribe).
    fn subscribe(
        &self,
        options: SubscriptionOptions,
        updates: UpdateSender,
    ) -> Result<SubscriptionHandle, AlarmError>;

    /// Stop a subscription. Unknown handles are ignored.
    ///
    /// The subscription's [`UpdateSender`] must be dropped here so the
    /// receiving side sees the channel close.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Create a fresh update channel for a subscription.
pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    mpsc::unbounded_channel()
}
