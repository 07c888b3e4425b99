//! Featured panel backend: periodic refresh feeding the UI channel.

use std::sync::Arc;
use std::time::Duration;

use tomorrow_weather::{FeaturedRefresher, RefreshUpdate, WeatherSource};

/// Messages sent from the refresher back to the UI thread
#[derive(Debug)]
pub enum FeaturedServiceMessage {
    Refreshed(RefreshUpdate),
}

/// Start the refresh loop. Each completed cycle sends `Refreshed`.
///
/// The returned handle owns the loop; dropping it stops the refresh.
pub fn start_refresh(
    runtime: &tokio::runtime::Handle,
    tx: &std::sync::mpsc::Sender<FeaturedServiceMessage>,
    source: Arc<dyn WeatherSource>,
    cities: Vec<String>,
    period: Option<Duration>,
) -> FeaturedRefresher {
    let tx = tx.clone();
    FeaturedRefresher::start(runtime, source, cities, period, move |update| {
        if tx.send(FeaturedServiceMessage::Refreshed(update)).is_err() {
            tracing::debug!("Featured channel closed; dropping refresh result");
        }
    })
}
