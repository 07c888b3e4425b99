use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Prefix for environment overrides, e.g. `TOMORROW__WEATHER__BASE_URL`.
const ENV_PREFIX: &str = "TOMORROW";
const ENV_SEPARATOR: &str = "__";
/// List-valued settings accept a comma-separated environment value.
const ENV_LIST_SEPARATOR: &str = ",";
const ENV_LIST_KEYS: [&str; 1] = ["featured.cities"];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream weather API settings
    pub weather: WeatherConfig,

    /// Featured cities panel
    pub featured: FeaturedConfig,

    /// Fallback position for "weather here"
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the forecast API (without the `/forecast.json` suffix)
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    ///
    /// The key itself never lives in the config file.
    pub api_key_env: String,

    /// How long a fetched result may be reused before it is fetched again
    pub revalidate_minutes: u32,

    /// Request timeout; unset leaves the HTTP client's default in place
    pub timeout_seconds: Option<u64>,
}

impl WeatherConfig {
    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(u64::from(self.revalidate_minutes) * 60)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weatherapi.com/v1".to_string(),
            api_key_env: "WEATHER_API_KEY".to_string(),
            revalidate_minutes: 60,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturedConfig {
    /// Curated cities shown in the featured panel, in display order
    pub cities: Vec<String>,

    /// Refresh interval in minutes
    pub refresh_minutes: u32,
}

impl FeaturedConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_minutes) * 60)
    }
}

const DEFAULT_FEATURED_CITIES: [&str; 30] = [
    "Tokyo",
    "Paris",
    "London",
    "New York",
    "Dubai",
    "Rome",
    "Singapore",
    "Barcelona",
    "Los Angeles",
    "Sydney",
    "Istanbul",
    "Bangkok",
    "Amsterdam",
    "Prague",
    "Seoul",
    "Hong Kong",
    "Cairo",
    "Rio de Janeiro",
    "Moscow",
    "Berlin",
    "Toronto",
    "San Francisco",
    "Las Vegas",
    "Madrid",
    "Chicago",
    "Vienna",
    "Shanghai",
    "Mexico City",
    "Mumbai",
    "Buenos Aires",
];

impl Default for FeaturedConfig {
    fn default() -> Self {
        Self {
            cities: DEFAULT_FEATURED_CITIES.iter().map(|c| c.to_string()).collect(),
            refresh_minutes: 60,
        }
    }
}

/// Optional fixed position, used when no system geolocation is available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Both coordinates, or `None` if either is missing.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist.
    ///
    /// Environment overrides (`TOMORROW__SECTION__KEY`) are applied on top.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, layered with environment overrides.
    ///
    /// A missing file is not an error; defaults fill every unset field.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_layered(path, ENV_PREFIX)
    }

    fn load_layered(path: &Path, env_prefix: &str) -> Result<Self> {
        let environment = ENV_LIST_KEYS.iter().fold(
            config::Environment::with_prefix(env_prefix)
                .separator(ENV_SEPARATOR)
                .list_separator(ENV_LIST_SEPARATOR)
                .try_parsing(true),
            |env, key| env.with_list_parse_key(key),
        );

        let settings = config::Config::builder()
            .add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        settings
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load()?.into_validated()
    }

    /// Like [`Config::load_validated`], reading an explicit file.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        Self::load_from(path)?.into_validated()
    }

    fn into_validated(self) -> Result<(Self, ValidationResult)> {
        let validation = self.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.api_key_env.trim().is_empty() {
            result.add_error("weather.api_key_env", "Environment variable name cannot be empty");
        }

        if self.weather.revalidate_minutes == 0 {
            result.add_warning(
                "weather.revalidate_minutes",
                "Revalidation disabled (0 minutes); every lookup hits the API",
            );
        }

        if self.weather.timeout_seconds == Some(0) {
            result.add_error("weather.timeout_seconds", "Timeout must be greater than 0");
        }

        let mut seen = HashSet::new();
        for city in &self.featured.cities {
            if city.trim().is_empty() {
                result.add_error("featured.cities", "City names cannot be empty");
            } else if !seen.insert(city.trim().to_lowercase()) {
                result.add_error("featured.cities", format!("Duplicate city: {}", city));
            }
        }

        if self.featured.cities.is_empty() {
            result.add_warning("featured.cities", "No featured cities configured");
        }

        if self.featured.refresh_minutes == 0 {
            result.add_warning(
                "featured.refresh_minutes",
                "Featured refresh disabled (0 minutes)",
            );
        } else if self.featured.refresh_minutes > 1440 {
            result.add_warning(
                "featured.refresh_minutes",
                "Featured refresh interval is more than 24 hours",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", format!("Out of range: {}", lat));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", format!("Out of range: {}", lon));
                }
            }
            (None, None) => {}
            _ => result.add_error(
                "location",
                "Both latitude and longitude must be set, or neither",
            ),
        }

        result
    }

    /// Validate a URL field
    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding the configuration file
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tomorrow"))
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_featured_cities() {
        let config = Config::default();
        assert_eq!(config.featured.cities.len(), 30);
        assert_eq!(config.featured.cities[0], "Tokyo");
        assert_eq!(config.featured.cities[29], "Buenos Aires");
        assert_eq!(config.featured.refresh_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.base_url = "ftp://api.weatherapi.com/v1".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_duplicate_featured_city() {
        let mut config = Config::default();
        config.featured.cities = vec!["Paris".into(), "London".into(), "paris".into()];
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("Duplicate")));
    }

    #[test]
    fn test_half_specified_location() {
        let mut config = Config::default();
        config.location.latitude = Some(35.68);
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(config.location.position().is_none());

        config.location.longitude = Some(139.69);
        assert!(config.validate().is_valid());
        assert_eq!(config.location.position(), Some((35.68, 139.69)));
    }

    #[test]
    fn test_zero_refresh_is_warning() {
        let mut config = Config::default();
        config.featured.refresh_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "featured.refresh_minutes"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.featured.cities = vec!["Oslo".into(), "Lima".into()];
        config.location.latitude = Some(59.91);
        config.location.longitude = Some(10.75);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.featured.cities, vec!["Oslo", "Lima"]);
        assert_eq!(loaded.location.position(), Some((59.91, 10.75)));
        assert_eq!(loaded.weather.api_key_env, "WEATHER_API_KEY");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.weather.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(loaded.weather.api_key_env, "WEATHER_API_KEY");
        assert!(loaded.weather.timeout().is_none());
    }

    #[test]
    fn test_env_overrides_featured_cities() {
        let prefix = "TOMORROW_TEST_CITIES";
        std::env::set_var("TOMORROW_TEST_CITIES__FEATURED__CITIES", "Oslo,Lima");
        std::env::set_var("TOMORROW_TEST_CITIES__FEATURED__REFRESH_MINUTES", "15");

        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_layered(&dir.path().join("absent.toml"), prefix);

        std::env::remove_var("TOMORROW_TEST_CITIES__FEATURED__CITIES");
        std::env::remove_var("TOMORROW_TEST_CITIES__FEATURED__REFRESH_MINUTES");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.featured.cities, vec!["Oslo", "Lima"]);
        assert_eq!(loaded.featured.refresh_minutes, 15);
        assert_eq!(loaded.weather.base_url, "https://api.weatherapi.com/v1");
    }

    #[test]
    fn test_env_single_city_is_a_list() {
        std::env::set_var("TOMORROW_TEST_ONE_CITY__FEATURED__CITIES", "Tokyo");

        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_layered(&dir.path().join("absent.toml"), "TOMORROW_TEST_ONE_CITY");

        std::env::remove_var("TOMORROW_TEST_ONE_CITY__FEATURED__CITIES");
        assert_eq!(loaded.unwrap().featured.cities, vec!["Tokyo"]);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[featured]\nrefresh_minutes = 30\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.featured.refresh_minutes, 30);
        assert_eq!(loaded.featured.cities.len(), 30);
        assert_eq!(loaded.weather.revalidate_after(), Duration::from_secs(3600));
    }
}
