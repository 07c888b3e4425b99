//! WeatherAPI.com wire format and conversion into the record model.
//!
//! Every field the model needs is required here; a body missing any of them
//! is rejected as an upstream error instead of producing a partial record.

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::types::{CurrentWeatherData, DailyForecast, FullWeatherData, WeatherError};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: ApiLocation,
    current: ApiCurrent,
    forecast: ApiForecast,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    condition: ApiCondition,
    humidity: f64,
    wind_kph: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date: String,
    day: ApiDay,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: ApiCondition,
}

/// Error payload: `{"error": {"code": 1006, "message": "No matching location found."}}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Parse a successful forecast body into the record model.
pub fn parse_forecast(body: &[u8]) -> Result<FullWeatherData, WeatherError> {
    let response: ForecastResponse = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Malformed forecast response: {}", e);
        WeatherError::upstream(format!(
            "Received unexpected data from the weather service ({}).",
            e
        ))
    })?;

    into_full_weather(response)
}

/// Map a non-success response to an error.
///
/// 400 means the query did not resolve to a location. Anything else uses the
/// API's own message when the body carries one.
pub fn error_from_status(status: StatusCode, body: &[u8]) -> WeatherError {
    if status == StatusCode::BAD_REQUEST {
        return WeatherError::NotFound;
    }

    let upstream_message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error.message)
        .filter(|m| !m.trim().is_empty());

    match upstream_message {
        Some(message) => WeatherError::Upstream(message),
        None => WeatherError::Upstream(format!(
            "API error: {}",
            status.canonical_reason().unwrap_or(status.as_str())
        )),
    }
}

fn into_full_weather(response: ForecastResponse) -> Result<FullWeatherData, WeatherError> {
    let current = CurrentWeatherData {
        city: response.location.name,
        country: response.location.country,
        temperature: round_half_up(response.current.temp_c),
        condition: response.current.condition.text,
        humidity: percent(response.current.humidity)?,
        wind_speed: round_half_up(response.current.wind_kph),
        icon: absolute_icon_url(&response.current.condition.icon)?,
    };

    let forecast = response
        .forecast
        .forecastday
        .into_iter()
        .map(into_daily_forecast)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FullWeatherData { current, forecast })
}

fn into_daily_forecast(day: ApiForecastDay) -> Result<DailyForecast, WeatherError> {
    let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").map_err(|e| {
        WeatherError::upstream(format!("Invalid forecast date '{}': {}", day.date, e))
    })?;

    Ok(DailyForecast {
        date,
        day_of_week: date.format("%a").to_string(),
        max_temp: round_half_up(day.day.maxtemp_c),
        min_temp: round_half_up(day.day.mintemp_c),
        condition: day.day.condition.text,
        icon: absolute_icon_url(&day.day.condition.icon)?,
    })
}

/// Round to the nearest integer, halves toward positive infinity (2.5 -> 3, -2.5 -> -2).
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn percent(value: f64) -> Result<u8, WeatherError> {
    let rounded = round_half_up(value);
    u8::try_from(rounded)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| WeatherError::upstream(format!("Humidity out of range: {}", value)))
}

/// Icons come back scheme-relative (`//cdn.weatherapi.com/...`); give them a scheme.
pub fn absolute_icon_url(icon: &str) -> Result<String, WeatherError> {
    let icon = icon.trim();
    if icon.is_empty() {
        return Err(WeatherError::upstream("Missing condition icon"));
    }

    if icon.starts_with("https://") || icon.starts_with("http://") {
        Ok(icon.to_string())
    } else if icon.starts_with("//") {
        Ok(format!("https:{}", icon))
    } else {
        Ok(format!("https://{}", icon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(date: &str, max: f64, min: f64) -> serde_json::Value {
        json!({
            "date": date,
            "day": {
                "maxtemp_c": max,
                "mintemp_c": min,
                "condition": {"text": "Sunny", "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png"}
            }
        })
    }

    fn body(days: Vec<serde_json::Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "location": {"name": "Tokyo", "country": "Japan", "lat": 35.69, "lon": 139.69},
            "current": {
                "temp_c": 21.6,
                "humidity": 64,
                "wind_kph": 14.4,
                "feelslike_c": 21.0,
                "condition": {"text": "Partly cloudy", "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png", "code": 1003}
            },
            "forecast": {"forecastday": days}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_rounds_and_normalizes() {
        let data = parse_forecast(&body(vec![day("2024-06-03", 25.5, 17.4)])).unwrap();

        assert_eq!(data.current.city, "Tokyo");
        assert_eq!(data.current.country, "Japan");
        assert_eq!(data.current.temperature, 22);
        assert_eq!(data.current.wind_speed, 14);
        assert_eq!(data.current.humidity, 64);
        assert_eq!(
            data.current.icon,
            "https://cdn.weatherapi.com/weather/64x64/day/116.png"
        );

        let today = &data.forecast[0];
        assert_eq!(today.max_temp, 26);
        assert_eq!(today.min_temp, 17);
        assert!(today.icon.starts_with("https:"));
    }

    #[test]
    fn test_forecast_order_and_weekdays() {
        let days = vec![
            day("2024-06-03", 20.0, 10.0),
            day("2024-06-04", 21.0, 11.0),
            day("2024-06-01", 22.0, 12.0),
        ];
        let data = parse_forecast(&body(days)).unwrap();

        let dates: Vec<String> = data.forecast.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-03", "2024-06-04", "2024-06-01"]);

        let weekdays: Vec<&str> = data.forecast.iter().map(|d| d.day_of_week.as_str()).collect();
        assert_eq!(weekdays, vec!["Mon", "Tue", "Sat"]);
    }

    #[test]
    fn test_missing_field_is_upstream_error() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&body(vec![day("2024-06-03", 20.0, 10.0)])).unwrap();
        value["current"].as_object_mut().unwrap().remove("wind_kph");

        let err = parse_forecast(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(_)));
    }

    #[test]
    fn test_bad_date_is_upstream_error() {
        let err = parse_forecast(&body(vec![day("03/06/2024", 20.0, 10.0)])).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(ref m) if m.contains("03/06/2024")));
    }

    #[test]
    fn test_not_json_is_upstream_error() {
        let err = parse_forecast(b"<html>gateway</html>").unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(_)));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(21.6), 22);
        assert_eq!(round_half_up(14.4), 14);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(-0.4), 0);
    }

    #[test]
    fn test_humidity_out_of_range() {
        assert!(percent(100.0).is_ok());
        assert!(percent(101.0).is_err());
        assert!(percent(-3.0).is_err());
    }

    #[test]
    fn test_absolute_icon_url() {
        assert_eq!(
            absolute_icon_url("//cdn.weatherapi.com/a.png").unwrap(),
            "https://cdn.weatherapi.com/a.png"
        );
        assert_eq!(
            absolute_icon_url("https://cdn.weatherapi.com/a.png").unwrap(),
            "https://cdn.weatherapi.com/a.png"
        );
        assert_eq!(
            absolute_icon_url("cdn.weatherapi.com/a.png").unwrap(),
            "https://cdn.weatherapi.com/a.png"
        );
        assert!(absolute_icon_url("  ").is_err());
    }

    #[test]
    fn test_error_from_status_400_is_not_found() {
        let body = br#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        assert_eq!(
            error_from_status(StatusCode::BAD_REQUEST, body),
            WeatherError::NotFound
        );
    }

    #[test]
    fn test_error_from_status_uses_upstream_message() {
        let body = br#"{"error":{"code":2006,"message":"API key is invalid."}}"#;
        assert_eq!(
            error_from_status(StatusCode::UNAUTHORIZED, body),
            WeatherError::Upstream("API key is invalid.".into())
        );
    }

    #[test]
    fn test_error_from_status_falls_back_to_status() {
        assert_eq!(
            error_from_status(StatusCode::SERVICE_UNAVAILABLE, b"upstream down"),
            WeatherError::Upstream("API error: Service Unavailable".into())
        );
    }
}
