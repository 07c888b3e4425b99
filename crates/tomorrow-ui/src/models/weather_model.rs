//! Main display: search box, locate action and the lookup result.
//!
//! Requests go out through the weather service and come back on the
//! AppServices channel; call `poll_channel` from the UI loop to apply them.

use std::sync::Arc;

use tomorrow_core::AppError;
use tomorrow_weather::{Coordinates, FullWeatherData, LocationQuery, WeatherSource};

use crate::app_services::{AppServices, WeatherServiceMessage};
use crate::services::{self, WeatherServiceError};

/// What the main display shows. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayState {
    /// Nothing requested yet; show the welcome copy
    #[default]
    Idle,
    Loading,
    Error(String),
    Loaded(FullWeatherData),
}

pub struct WeatherModel {
    services: Arc<AppServices>,
    search_text: String,
    state: DisplayState,
    /// A text search (as opposed to a locate) is in flight
    searching: bool,
}

impl WeatherModel {
    pub fn new(services: Arc<AppServices>) -> Self {
        services.init_weather_service_channel();
        Self {
            services,
            search_text: String::new(),
            state: DisplayState::Idle,
            searching: false,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn weather(&self) -> Option<&FullWeatherData> {
        match &self.state {
            DisplayState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            DisplayState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == DisplayState::Loading
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Edits are ignored while a lookup is in flight.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        if self.is_loading() {
            return;
        }
        self.search_text = text.into();
    }

    pub fn can_search(&self) -> bool {
        !self.is_loading() && !self.search_text.trim().is_empty()
    }

    pub fn can_locate(&self) -> bool {
        !self.is_loading()
    }

    /// Submit the search text. Returns false when nothing was requested.
    pub fn search(&mut self) -> bool {
        if !self.can_search() {
            return false;
        }

        let query = LocationQuery::name(self.search_text.trim());
        tracing::info!("Searching weather for {}", query);

        let Some((tx, source)) = self.begin() else {
            return true;
        };
        self.searching = true;
        services::request_weather_lookup(&self.services.runtime(), &tx, source, query);
        true
    }

    /// Look up weather at the device position.
    pub fn locate(&mut self) -> bool {
        if !self.can_locate() {
            return false;
        }

        let Some((tx, source)) = self.begin() else {
            return true;
        };
        services::request_weather_locate(
            &self.services.runtime(),
            &tx,
            source,
            self.services.position_source(),
        );
        true
    }

    /// Look up weather at explicit coordinates.
    pub fn lookup_coordinates(&mut self, coordinates: Coordinates) -> bool {
        if self.is_loading() {
            return false;
        }

        let Some((tx, source)) = self.begin() else {
            return true;
        };
        services::request_weather_lookup(
            &self.services.runtime(),
            &tx,
            source,
            LocationQuery::from(coordinates),
        );
        true
    }

    /// A featured tile was chosen: same as typing the city and searching.
    pub fn select_featured(&mut self, city: &str) -> bool {
        if self.is_loading() {
            return false;
        }
        self.set_search_text(city);
        self.search()
    }

    /// Apply any finished lookups. Returns true if the state changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(msg) = self.services.try_recv_weather_message() {
            match msg {
                WeatherServiceMessage::LookupDone(result) => self.finish(result),
            }
            changed = true;
        }
        changed
    }

    /// Enter the loading state and hand back what a request needs.
    /// On failure the model is already in the error state.
    fn begin(
        &mut self,
    ) -> Option<(
        std::sync::mpsc::Sender<WeatherServiceMessage>,
        Arc<dyn WeatherSource>,
    )> {
        match (
            self.services.weather_service_tx(),
            self.services.weather_source(),
        ) {
            (Some(tx), Some(source)) => {
                self.state = DisplayState::Loading;
                Some((tx, source))
            }
            _ => {
                tracing::error!("Weather services not initialized");
                self.finish(Err(WeatherServiceError::NotInitialized));
                None
            }
        }
    }

    fn finish(&mut self, result: Result<FullWeatherData, WeatherServiceError>) {
        self.searching = false;
        self.state = match result {
            Ok(data) => {
                tracing::info!(
                    "Showing weather for {}, {}",
                    data.current.city,
                    data.current.country
                );
                DisplayState::Loaded(data)
            }
            Err(e) => DisplayState::Error(AppError::from(e).user_message()),
        };
    }
}
