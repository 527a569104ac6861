//! Error taxonomy for the alarm core.
//!
//! None of these are fatal. The tracking session reports provider and
//! permission failures as a `false` return plus a log line, and reverse
//! geocoding failures collapse to "no address". Retrying is up to the caller.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlarmError {
    /// The position provider refused location access
    #[error("location permission denied")]
    PermissionDenied,

    /// Subscription setup or a position query failed
    #[error("location provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Reverse lookup produced no address
    #[error("reverse geocoding unavailable: {0}")]
    GeocodeUnavailable(String),

    /// Zone rejected at registration (bad center or radius)
    #[error("invalid zone: {0}")]
    InvalidZone(String),

    /// A recorded route could not be parsed
    #[error("route line {line}: {reason}")]
    Route { line: usize, reason: String },

    /// Persistence provider file operations failed
    #[error("storage IO: {0}")]
    Storage(#[from] io::Error),

    /// Stored blob could not be encoded or decoded
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request to the geocoding service failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
