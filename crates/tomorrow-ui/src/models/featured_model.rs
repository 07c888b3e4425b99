use std::sync::Arc;

use tomorrow_weather::{FeaturedPanel, FullWeatherData, PanelUpdate};

use crate::app_services::{AppServices, FeaturedServiceMessage};

/// One entry in the featured strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedTile {
    pub city: String,
    pub temperature: i32,
    pub condition: String,
    pub icon: String,
}

impl From<&FullWeatherData> for FeaturedTile {
    fn from(data: &FullWeatherData) -> Self {
        Self {
            city: data.current.city.clone(),
            temperature: data.current.temperature,
            condition: data.current.condition.clone(),
            icon: data.current.icon.clone(),
        }
    }
}

pub struct FeaturedModel {
    services: Arc<AppServices>,
    panel: FeaturedPanel,
    active: bool,
}

impl FeaturedModel {
    pub fn new(services: Arc<AppServices>) -> Self {
        Self {
            services,
            panel: FeaturedPanel::new(),
            active: false,
        }
    }

    /// Begin refreshing; the first load starts immediately.
    pub fn start(&mut self) -> bool {
        self.active = self.services.start_featured_refresh();
        self.active
    }

    pub fn stop(&mut self) {
        self.services.stop_featured_refresh();
        self.active = false;
    }

    pub fn refresh_now(&self) {
        self.services.refresh_featured_now();
    }

    /// The first load is still running (show placeholders, not "empty")
    pub fn is_loading_first(&self) -> bool {
        self.active && !self.panel.is_loaded()
    }

    pub fn is_loaded(&self) -> bool {
        self.panel.is_loaded()
    }

    pub fn tile_count(&self) -> usize {
        self.panel.entries().len()
    }

    pub fn tile(&self, index: usize) -> Option<FeaturedTile> {
        self.panel.entries().get(index).map(FeaturedTile::from)
    }

    pub fn tiles(&self) -> Vec<FeaturedTile> {
        self.panel.entries().iter().map(FeaturedTile::from).collect()
    }

    /// Apply finished refresh cycles. Returns true if the tiles changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(msg) = self.services.try_recv_featured_message() {
            match msg {
                FeaturedServiceMessage::Refreshed(update) => {
                    match self.panel.apply(update.generation, update.results) {
                        PanelUpdate::Replaced(count) => {
                            tracing::debug!("Featured panel now has {} cities", count);
                            changed = true;
                        }
                        PanelUpdate::Retained | PanelUpdate::Stale => {}
                    }
                }
            }
        }
        changed
    }
}

impl Drop for FeaturedModel {
    fn drop(&mut self) {
        if self.active {
            self.services.stop_featured_refresh();
        }
    }
}
