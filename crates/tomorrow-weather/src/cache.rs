//! In-memory lookup cache with a revalidation window.
//!
//! Entries live for the life of the process. Once an entry is older than the
//! window the next lookup goes to the network again, and every miss sweeps
//! out entries past the window.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::provider::WeatherSource;
use crate::types::{FullWeatherData, LocationQuery, WeatherError};

#[derive(Debug, Clone)]
struct CacheEntry {
    data: FullWeatherData,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct WeatherCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl WeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh data for `query`, if any
    pub fn get(&self, query: &LocationQuery) -> Option<FullWeatherData> {
        let entries = self.entries.lock();
        entries
            .get(&query.cache_key())
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.data.clone())
    }

    pub fn insert(&self, query: &LocationQuery, data: FullWeatherData) {
        self.entries.lock().insert(
            query.cache_key(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop entries past the window; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }
}

/// A [`WeatherSource`] that answers from a [`WeatherCache`] when it can.
///
/// Only successful lookups are stored.
pub struct RevalidatingSource<S: ?Sized> {
    cache: WeatherCache,
    inner: std::sync::Arc<S>,
}

impl<S: WeatherSource + ?Sized> RevalidatingSource<S> {
    pub fn new(inner: std::sync::Arc<S>, ttl: Duration) -> Self {
        Self {
            cache: WeatherCache::new(ttl),
            inner,
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }
}

#[async_trait]
impl<S: WeatherSource + ?Sized> WeatherSource for RevalidatingSource<S> {
    async fn lookup(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
        if self.cache.ttl.is_zero() {
            return self.inner.lookup(query).await;
        }

        if let Some(data) = self.cache.get(query) {
            tracing::debug!("Weather cache hit for {}", query);
            return Ok(data);
        }

        let data = self.inner.lookup(query).await?;
        let purged = self.cache.purge_expired();
        if purged > 0 {
            tracing::debug!("Dropped {} stale weather cache entries", purged);
        }
        self.cache.insert(query, data.clone());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CurrentWeatherData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn sample(city: &str, temperature: i32) -> FullWeatherData {
        FullWeatherData {
            current: CurrentWeatherData {
                city: city.into(),
                country: "Y".into(),
                temperature,
                condition: "Rain".into(),
                humidity: 90,
                wind_speed: 5,
                icon: "https://example.com/r.png".into(),
            },
            forecast: vec![],
        }
    }

    /// Counts calls; fails for "Nowhere"
    struct Upstream {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherSource for Upstream {
        async fn lookup(&self, query: &LocationQuery) -> Result<FullWeatherData, WeatherError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match query.as_query_param().as_str() {
                "Nowhere" => Err(WeatherError::NotFound),
                name => Ok(sample(name, n as i32)),
            }
        }
    }

    fn revalidating(ttl: Duration) -> (RevalidatingSource<Upstream>, Arc<Upstream>) {
        let upstream = Arc::new(Upstream {
            calls: AtomicUsize::new(0),
        });
        (RevalidatingSource::new(upstream.clone(), ttl), upstream)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_window() {
        let (source, upstream) = revalidating(HOUR);

        let a = source.lookup(&LocationQuery::name("Tokyo")).await.unwrap();
        let b = source.lookup(&LocationQuery::name(" tokyo ")).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_refetches() {
        let (source, upstream) = revalidating(HOUR);
        let query = LocationQuery::name("Lima");

        source.lookup(&query).await.unwrap();
        tokio::time::advance(HOUR + Duration::from_secs(1)).await;
        let refreshed = source.lookup(&query).await.unwrap();

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.current.temperature, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_not_cached() {
        let (source, upstream) = revalidating(HOUR);
        let query = LocationQuery::name("Nowhere");

        assert!(source.lookup(&query).await.is_err());
        assert!(source.lookup(&query).await.is_err());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert!(source.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_disables_cache() {
        let (source, upstream) = revalidating(Duration::ZERO);
        let query = LocationQuery::name("Oslo");

        source.lookup(&query).await.unwrap();
        source.lookup(&query).await.unwrap();
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = WeatherCache::new(Duration::from_secs(10));
        cache.insert(&LocationQuery::name("A"), sample("A", 1));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.insert(&LocationQuery::coordinates(1.0, 2.0), sample("B", 2));
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&LocationQuery::coordinates(1.0, 2.0)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_sweeps_stale_entries() {
        let (source, _upstream) = revalidating(Duration::from_secs(10));

        source.lookup(&LocationQuery::name("Rome")).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        source.lookup(&LocationQuery::name("Oslo")).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(source.cache().len(), 2);

        source.lookup(&LocationQuery::name("Lima")).await.unwrap();
        assert_eq!(source.cache().len(), 2);
        assert!(source.cache().get(&LocationQuery::name("Rome")).is_none());
        assert!(source.cache().get(&LocationQuery::name("Oslo")).is_some());
    }
}
