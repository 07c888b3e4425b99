//! WeatherAPI.com forecast client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::api;
use crate::types::{FullWeatherData, LocationQuery, WeatherError};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
/// Every lookup asks for a week of daily forecasts.
pub const FORECAST_DAYS: u8 = 7;

/// Anything that can answer a single-location lookup.
///
/// The aggregator, the cache and the presentation services all work against
/// this trait so tests can substitute canned sources.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn lookup(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError>;
}

#[async_trait]
impl<T: WeatherSource + ?Sized> WeatherSource for Arc<T> {
    async fn lookup(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
        (**self).lookup(query).await
    }
}

/// Where the API key comes from
pub trait CredentialSource: Send + Sync + fmt::Debug {
    fn api_key(&self) -> Option<String>;
}

/// Reads the key from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// A fixed key, or none at all
#[derive(Clone)]
pub struct StaticCredential(pub Option<String>);

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.0.is_some() { "<redacted>" } else { "<none>" };
        f.debug_tuple("StaticCredential").field(&shown).finish()
    }
}

impl CredentialSource for StaticCredential {
    fn api_key(&self) -> Option<String> {
        self.0.clone().filter(|k| !k.trim().is_empty())
    }
}

/// Client settings
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub base_url: String,
    /// `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    endpoint: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl WeatherProvider {
    pub fn new(
        options: ProviderOptions,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, WeatherError> {
        let endpoint = forecast_endpoint(&options.base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            WeatherError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    /// Fetch current conditions and the daily forecast for one location.
    ///
    /// Fails with a configuration error before touching the network when no
    /// API key is available.
    #[instrument(skip(self, query), fields(query = %query), level = "info")]
    pub async fn fetch(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
        let api_key = self.credentials.api_key().ok_or_else(|| {
            tracing::error!("Weather API key is not configured");
            WeatherError::missing_api_key()
        })?;

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &api_key)
            .append_pair("q", &query.as_query_param())
            .append_pair("days", &FORECAST_DAYS.to_string())
            .append_pair("aqi", "no")
            .append_pair("alerts", "no");

        // The request URL carries the key; strip it from anything logged.
        let response = self.client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!("Weather request failed: {}", e);
            WeatherError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!("Failed to read weather response: {}", e);
            WeatherError::Network(e.to_string())
        })?;

        if !status.is_success() {
            let err = api::error_from_status(status, &body);
            tracing::warn!("Weather API returned {}: {}", status, err);
            return Err(err);
        }

        let data = api::parse_forecast(&body)?;
        tracing::debug!(
            "Fetched weather for {}, {} ({} forecast days)",
            data.current.city,
            data.current.country,
            data.forecast.len()
        );
        Ok(data)
    }

    pub async fn fetch_city(&self, name: &str) -> Result<FullWeatherData, WeatherError> {
        self.fetch(&LocationQuery::name(name)).await
    }

    pub async fn fetch_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<FullWeatherData, WeatherError> {
        self.fetch(&LocationQuery::coordinates(latitude, longitude))
            .await
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn lookup(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
        self.fetch(query).await
    }
}

fn forecast_endpoint(base_url: &str) -> Result<Url, WeatherError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{}/forecast.json", trimmed)).map_err(|e| {
        WeatherError::Configuration(format!("Invalid weather base URL '{}': {}", base_url, e))
    })
}
