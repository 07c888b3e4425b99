use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::location::Coordinates;

/// Current conditions for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentWeatherData {
    pub city: String,
    pub country: String,
    /// Degrees Celsius, rounded
    pub temperature: i32,
    pub condition: String,
    /// Relative humidity, percent
    pub humidity: u8,
    /// km/h, rounded
    pub wind_speed: i32,
    /// Absolute icon URL
    pub icon: String,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Three-letter English weekday, e.g. "Mon"
    pub day_of_week: String,
    pub max_temp: i32,
    pub min_temp: i32,
    pub condition: String,
    pub icon: String,
}

/// Result of one lookup: current conditions plus the forecast, first day is today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullWeatherData {
    pub current: CurrentWeatherData,
    pub forecast: Vec<DailyForecast>,
}

/// What a lookup asks the API for
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Free-text place name, e.g. "Rio de Janeiro"
    Name(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates(Coordinates::new(latitude, longitude))
    }

    /// Value for the API's `q` parameter (unencoded)
    pub fn as_query_param(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
        }
    }

    /// Key under which identical lookups are considered the same request
    pub fn cache_key(&self) -> String {
        match self {
            Self::Name(name) => format!("name:{}", name.trim().to_lowercase()),
            Self::Coordinates(c) => format!("coords:{},{}", c.latitude, c.longitude),
        }
    }
}

impl From<Coordinates> for LocationQuery {
    fn from(coordinates: Coordinates) -> Self {
        Self::Coordinates(coordinates)
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Coordinates(c) => write!(f, "{:.4}, {:.4}", c.latitude, c.longitude),
        }
    }
}

/// Lookup failures. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    /// Missing credential or unusable provider settings; no request was made
    #[error("{0}")]
    Configuration(String),

    /// The API could not resolve the requested location
    #[error("Could not find weather for the specified location. Please try another.")]
    NotFound,

    /// Any other non-success response, or a success body we could not use
    #[error("{0}")]
    Upstream(String),

    /// No response at all; the detail is kept for logs only
    #[error("Could not reach the weather service. Please check your connection and try again.")]
    Network(String),
}

impl WeatherError {
    pub fn missing_api_key() -> Self {
        Self::Configuration("Weather API key is not configured.".to_string())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Human-readable message for callers
    pub fn message(&self) -> String {
        self.to_string()
    }
}
