//! Plain-text views for terminal front ends.

use std::fmt::Write;

use tomorrow_weather::{CurrentWeatherData, DailyForecast};

use crate::models::{DisplayState, FeaturedModel, FeaturedTile};

pub const WELCOME_TITLE: &str = "Welcome to Tomorrow Weather";
pub const WELCOME_BODY: &str =
    "Search for a city, or use your current location to get the weather where you are.";
pub const LOADING_TEXT: &str = "Loading Weather Data...";
pub const FEATURED_TITLE: &str = "Featured Cities";
const FEATURED_LOADING_TEXT: &str = "Loading featured cities...";
const FEATURED_EMPTY_TEXT: &str = "No featured cities available right now.";

/// Render the main display for any state.
pub fn render_display(state: &DisplayState) -> String {
    match state {
        DisplayState::Idle => format!("{}\n{}\n", WELCOME_TITLE, WELCOME_BODY),
        DisplayState::Loading => format!("{}\n", LOADING_TEXT),
        DisplayState::Error(message) => format!("Error: {}\n", message),
        DisplayState::Loaded(data) => {
            let mut out = render_current(&data.current);
            if !data.forecast.is_empty() {
                out.push('\n');
                out.push_str(&render_forecast(&data.forecast));
            }
            out
        }
    }
}

pub fn render_current(current: &CurrentWeatherData) -> String {
    format!(
        "{}, {}\n{}°C  {}\nHumidity {}%  Wind {} km/h\n",
        current.city,
        current.country,
        current.temperature,
        current.condition,
        current.humidity,
        current.wind_speed
    )
}

/// The first row is labelled "Today"; the rest use their weekday.
pub fn render_forecast(forecast: &[DailyForecast]) -> String {
    let mut out = format!("{}-Day Forecast\n", forecast.len());
    for (index, day) in forecast.iter().enumerate() {
        let label = if index == 0 { "Today" } else { day.day_of_week.as_str() };
        let _ = writeln!(
            out,
            "{:<6}{:>4}° / {:>3}°  {}",
            label, day.max_temp, day.min_temp, day.condition
        );
    }
    out
}

pub fn render_tile(tile: &FeaturedTile) -> String {
    format!("{}  {}°C  {}", tile.city, tile.temperature, tile.condition)
}

pub fn render_featured(model: &FeaturedModel) -> String {
    let mut out = format!("{}\n", FEATURED_TITLE);
    if model.is_loading_first() {
        out.push_str(FEATURED_LOADING_TEXT);
        out.push('\n');
        return out;
    }

    let tiles = model.tiles();
    if tiles.is_empty() {
        out.push_str(FEATURED_EMPTY_TEXT);
        out.push('\n');
        return out;
    }

    for (index, tile) in tiles.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", index + 1, render_tile(tile));
    }
    out
}
