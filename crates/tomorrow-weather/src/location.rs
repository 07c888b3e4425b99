//! Device position lookup.
//!
//! The desktop has no universal positioning service, so the position comes
//! from a [`PositionSource`]. The CLI wires a [`FixedPosition`] from
//! configuration when one is set, otherwise [`NoPositionSource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Why the device position could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location access was denied. Please enable it in your system settings and try again.")]
    PermissionDenied,

    #[error("Your location is currently unavailable.")]
    PositionUnavailable,

    #[error("Request for your location timed out.")]
    Timeout,

    #[error("Could not determine your location. Please use the search bar.")]
    Unknown,

    #[error("Geolocation is not supported on this device. Please use the search bar.")]
    Unsupported,
}

impl GeolocationError {
    /// Map a numeric position-error code (1 denied, 2 unavailable, 3 timeout).
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Something that can report where the device is
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Used when no position provider is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositionSource;

#[async_trait]
impl PositionSource for NoPositionSource {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}
