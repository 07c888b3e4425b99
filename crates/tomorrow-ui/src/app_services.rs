//! Centralized application services.
//!
//! A single `AppServices` struct holds the runtime, the weather source, the
//! position source, the service channels and the featured refresher. The
//! weather source and channels sit behind RwLock so shutdown can clear them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tomorrow_core::{AppError, Config, ConfigError};
use tomorrow_weather::{
    Coordinates, EnvCredential, FeaturedRefresher, FixedPosition, NoPositionSource,
    PositionSource, ProviderOptions, RevalidatingSource, WeatherProvider, WeatherSource,
};

pub use crate::services::{FeaturedServiceMessage, WeatherServiceMessage};

type Channel<T> = (
    RwLock<Option<std::sync::mpsc::Sender<T>>>,
    RwLock<Option<Mutex<std::sync::mpsc::Receiver<T>>>>,
);

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    /// Lookup source (provider behind the revalidation cache)
    weather_source: RwLock<Option<Arc<dyn WeatherSource>>>,

    /// Device position for the locate action
    position_source: Arc<dyn PositionSource>,

    featured_cities: Vec<String>,
    featured_period: Option<Duration>,
    featured_refresher: Mutex<Option<FeaturedRefresher>>,

    weather_channel: Channel<WeatherServiceMessage>,
    featured_channel: Channel<FeaturedServiceMessage>,
}

impl AppServices {
    /// Build all services from configuration.
    pub fn from_config(config: &Config) -> Result<Arc<Self>, AppError> {
        let provider = WeatherProvider::new(
            ProviderOptions {
                base_url: config.weather.base_url.clone(),
                timeout: config.weather.timeout(),
            },
            Arc::new(EnvCredential::new(config.weather.api_key_env.clone())),
        )
        .map_err(|e| AppError::Config(ConfigError::Invalid(e.to_string())))?;

        let source: Arc<dyn WeatherSource> = Arc::new(RevalidatingSource::new(
            Arc::new(provider),
            config.weather.revalidate_after(),
        ));

        let position: Arc<dyn PositionSource> = match config.location.position() {
            Some((latitude, longitude)) => {
                tracing::info!("Using configured position {}, {}", latitude, longitude);
                Arc::new(FixedPosition(Coordinates::new(latitude, longitude)))
            }
            None => Arc::new(NoPositionSource),
        };

        Self::with_sources(
            source,
            position,
            config.featured.cities.clone(),
            Some(config.featured.refresh_interval()),
        )
    }

    /// Build services around explicit sources.
    pub fn with_sources(
        weather_source: Arc<dyn WeatherSource>,
        position_source: Arc<dyn PositionSource>,
        featured_cities: Vec<String>,
        featured_period: Option<Duration>,
    ) -> Result<Arc<Self>, AppError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("tomorrow-tokio")
            .build()?;

        Ok(Arc::new(Self {
            runtime,
            weather_source: RwLock::new(Some(weather_source)),
            position_source,
            featured_cities,
            featured_period: featured_period.filter(|p| !p.is_zero()),
            featured_refresher: Mutex::new(None),
            weather_channel: (RwLock::new(None), RwLock::new(None)),
            featured_channel: (RwLock::new(None), RwLock::new(None)),
        }))
    }

    /// Get the tokio runtime handle.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn weather_source(&self) -> Option<Arc<dyn WeatherSource>> {
        self.weather_source.read().clone()
    }

    pub fn position_source(&self) -> Arc<dyn PositionSource> {
        self.position_source.clone()
    }

    // =========== Weather Service Channel ===========

    /// Get weather service sender.
    pub fn weather_service_tx(&self) -> Option<std::sync::mpsc::Sender<WeatherServiceMessage>> {
        self.weather_channel.0.read().clone()
    }

    /// Initialize weather service channel.
    pub fn init_weather_service_channel(&self) -> bool {
        init_channel(&self.weather_channel, "Weather")
    }

    /// Try to receive a message from the weather service channel (non-blocking).
    pub fn try_recv_weather_message(&self) -> Option<WeatherServiceMessage> {
        try_recv(&self.weather_channel)
    }

    // =========== Featured Service Channel ===========

    pub fn featured_service_tx(&self) -> Option<std::sync::mpsc::Sender<FeaturedServiceMessage>> {
        self.featured_channel.0.read().clone()
    }

    pub fn init_featured_service_channel(&self) -> bool {
        init_channel(&self.featured_channel, "Featured")
    }

    pub fn try_recv_featured_message(&self) -> Option<FeaturedServiceMessage> {
        try_recv(&self.featured_channel)
    }

    // =========== Featured Refresh ===========

    /// Start the featured refresh loop if it is not already running.
    pub fn start_featured_refresh(&self) -> bool {
        let mut refresher = self.featured_refresher.lock();
        if refresher.as_ref().is_some_and(FeaturedRefresher::is_running) {
            return true;
        }

        self.init_featured_service_channel();
        let (Some(tx), Some(source)) = (self.featured_service_tx(), self.weather_source()) else {
            tracing::error!("Cannot start featured refresh - services not ready");
            return false;
        };

        *refresher = Some(crate::services::start_featured_refresh(
            &self.runtime(),
            &tx,
            source,
            self.featured_cities.clone(),
            self.featured_period,
        ));
        true
    }

    /// Ask for an immediate refresh cycle.
    pub fn refresh_featured_now(&self) {
        if let Some(refresher) = self.featured_refresher.lock().as_ref() {
            refresher.refresh_now();
        }
    }

    pub fn stop_featured_refresh(&self) {
        if let Some(mut refresher) = self.featured_refresher.lock().take() {
            refresher.stop();
        }
    }

    pub fn is_featured_refresh_running(&self) -> bool {
        self.featured_refresher
            .lock()
            .as_ref()
            .is_some_and(FeaturedRefresher::is_running)
    }

    /// Stop the refresher and clear service references.
    ///
    /// Lookups requested afterwards fail as not initialized.
    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");

        self.stop_featured_refresh();
        *self.weather_source.write() = None;
        *self.weather_channel.0.write() = None;
        *self.weather_channel.1.write() = None;
        *self.featured_channel.0.write() = None;
        *self.featured_channel.1.write() = None;

        tracing::info!("AppServices shutdown complete");
    }
}

fn init_channel<T>(channel: &Channel<T>, name: &str) -> bool {
    if channel.0.read().is_some() {
        return true;
    }

    let (tx, rx) = std::sync::mpsc::channel();
    *channel.0.write() = Some(tx);
    *channel.1.write() = Some(Mutex::new(rx));
    tracing::info!("{} service channel initialized", name);
    true
}

fn try_recv<T>(channel: &Channel<T>) -> Option<T> {
    let guard = channel.1.read();
    let rx = guard.as_ref()?;
    let result = rx.lock().try_recv().ok();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomorrow_weather::{FullWeatherData, LocationQuery, WeatherError};

    struct Unreachable;

    #[async_trait::async_trait]
    impl WeatherSource for Unreachable {
        async fn lookup(&self, _query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
            Err(WeatherError::Network("offline".into()))
        }
    }

    fn services() -> Arc<AppServices> {
        AppServices::with_sources(
            Arc::new(Unreachable),
            Arc::new(NoPositionSource),
            vec!["Tokyo".into()],
            Some(Duration::from_secs(3600)),
        )
        .unwrap()
    }

    #[test]
    fn channel_init_is_idempotent() {
        let services = services();
        assert!(services.weather_service_tx().is_none());
        assert!(services.init_weather_service_channel());
        assert!(services.init_weather_service_channel());
        assert!(services.weather_service_tx().is_some());
        assert!(services.try_recv_weather_message().is_none());
    }

    #[test]
    fn from_config_uses_no_position_without_location() {
        let services = AppServices::from_config(&Config::default()).unwrap();
        let position = services.position_source();
        let result = services
            .runtime()
            .block_on(async move { position.current_position().await });
        assert_eq!(result, Err(tomorrow_weather::GeolocationError::Unsupported));
    }

    #[test]
    fn refresh_lifecycle() {
        let services = services();
        assert!(!services.is_featured_refresh_running());

        assert!(services.start_featured_refresh());
        assert!(services.is_featured_refresh_running());

        services.stop_featured_refresh();
        assert!(!services.is_featured_refresh_running());
    }

    #[test]
    fn shutdown_clears_state() {
        let services = services();
        services.init_weather_service_channel();
        services.start_featured_refresh();

        services.shutdown();

        assert!(services.weather_source().is_none());
        assert!(services.weather_service_tx().is_none());
        assert!(!services.is_featured_refresh_running());
        assert!(!services.start_featured_refresh());
    }
}
