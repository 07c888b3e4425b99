//! Weather backend: single-location lookups.
//! All network work runs on the runtime; results are sent back via mpsc.

use std::sync::Arc;

use tomorrow_weather::{
    FullWeatherData, GeolocationError, LocationQuery, PositionSource, WeatherError, WeatherSource,
};

/// Error type for weather operations
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherServiceError {
    /// The lookup itself failed
    Lookup(WeatherError),
    /// The device position could not be obtained
    Location(GeolocationError),
    NotInitialized,
}

impl std::fmt::Display for WeatherServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherServiceError::Lookup(e) => write!(f, "{}", e),
            WeatherServiceError::Location(e) => write!(f, "{}", e),
            WeatherServiceError::NotInitialized => write!(f, "Weather service not initialized"),
        }
    }
}

impl std::error::Error for WeatherServiceError {}

impl From<WeatherError> for WeatherServiceError {
    fn from(e: WeatherError) -> Self {
        WeatherServiceError::Lookup(e)
    }
}

impl From<GeolocationError> for WeatherServiceError {
    fn from(e: GeolocationError) -> Self {
        WeatherServiceError::Location(e)
    }
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of a search, a featured-tile selection, or a locate
    LookupDone(Result<FullWeatherData, WeatherServiceError>),
}

/// Request a lookup for `query`.
/// Sends `LookupDone` on the channel when complete.
pub fn request_lookup(
    runtime: &tokio::runtime::Handle,
    tx: &std::sync::mpsc::Sender<WeatherServiceMessage>,
    source: Arc<dyn WeatherSource>,
    query: LocationQuery,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = source.lookup(&query).await.map_err(|e| {
            tracing::warn!("Lookup for {} failed: {}", query, e);
            WeatherServiceError::from(e)
        });
        let _ = tx.send(WeatherServiceMessage::LookupDone(result));
    });
}

/// Resolve the device position, then look up weather there.
/// Sends exactly one `LookupDone`, carrying either failure.
pub fn request_locate(
    runtime: &tokio::runtime::Handle,
    tx: &std::sync::mpsc::Sender<WeatherServiceMessage>,
    source: Arc<dyn WeatherSource>,
    position: Arc<dyn PositionSource>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let coordinates = match position.current_position().await {
            Ok(c) => {
                tracing::info!("Got location: {}, {}", c.latitude, c.longitude);
                c
            }
            Err(e) => {
                tracing::warn!("Could not get location: {:?}", e);
                let _ = tx.send(WeatherServiceMessage::LookupDone(Err(e.into())));
                return;
            }
        };

        let result = source
            .lookup(&LocationQuery::from(coordinates))
            .await
            .map_err(WeatherServiceError::from);
        let _ = tx.send(WeatherServiceMessage::LookupDone(result));
    });
}
