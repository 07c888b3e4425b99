//! Featured-cities aggregation.

use futures::future::join_all;

use crate::provider::WeatherSource;
use crate::types::{FullWeatherData, LocationQuery};

/// Look up every city concurrently and keep the successes, in input order.
///
/// A failing city is logged and skipped; it never fails the batch or cancels
/// the other lookups.
pub async fn fetch_featured<S>(source: &S, cities: &[String]) -> Vec<FullWeatherData>
where
    S: WeatherSource + ?Sized,
{
    let lookups = cities.iter().map(|city| async move {
        let query = LocationQuery::name(city.as_str());
        match source.lookup(&query).await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(city = %city, "Featured city lookup failed: {}", e);
                None
            }
        }
    });

    let results: Vec<FullWeatherData> = join_all(lookups).await.into_iter().flatten().collect();

    tracing::info!(
        "Featured lookup finished: {} of {} cities",
        results.len(),
        cities.len()
    );
    results
}

/// What [`FeaturedPanel::apply`] did with a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelUpdate {
    /// Entries replaced; holds the new entry count
    Replaced(usize),
    /// Empty result after a previous load; old entries kept
    Retained,
    /// Older than what is already shown; ignored
    Stale,
}

/// The featured strip's current contents.
///
/// Each refresh carries the generation it was scheduled under. A result is
/// applied only if no later generation has been applied already.
#[derive(Debug, Clone, Default)]
pub struct FeaturedPanel {
    entries: Vec<FullWeatherData>,
    loaded: bool,
    applied_generation: Option<u64>,
}

impl FeaturedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, generation: u64, results: Vec<FullWeatherData>) -> PanelUpdate {
        if self.applied_generation.is_some_and(|applied| generation <= applied) {
            tracing::debug!(
                "Ignoring featured generation {} (already at {:?})",
                generation,
                self.applied_generation
            );
            return PanelUpdate::Stale;
        }
        self.applied_generation = Some(generation);

        if results.is_empty() && self.loaded {
            tracing::warn!("Featured refresh returned no cities; keeping previous panel");
            return PanelUpdate::Retained;
        }

        self.entries = results;
        self.loaded = true;
        PanelUpdate::Replaced(self.entries.len())
    }

    pub fn entries(&self) -> &[FullWeatherData] {
        &self.entries
    }

    /// True once any result set (even an empty first one) has been applied
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn applied_generation(&self) -> Option<u64> {
        self.applied_generation
    }
}
