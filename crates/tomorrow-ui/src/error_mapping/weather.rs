use crate::services::weather_service::WeatherServiceError;
use tomorrow_core::AppError;

impl From<WeatherServiceError> for AppError {
    fn from(e: WeatherServiceError) -> Self {
        match e {
            WeatherServiceError::Lookup(e) => AppError::Lookup(e.message()),
            WeatherServiceError::Location(e) => AppError::Location(e.message()),
            WeatherServiceError::NotInitialized => {
                AppError::Other(anyhow::anyhow!("Weather service not initialized"))
            }
        }
    }
}
