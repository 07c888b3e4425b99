//! Periodic featured-cities refresh.
//!
//! One background task per refresher. Cycles run back to back, never
//! overlapping: fetch, deliver, then wait for the next tick, a manual
//! trigger, or cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::featured::fetch_featured;
use crate::provider::WeatherSource;
use crate::types::FullWeatherData;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Allocate a refresh generation. Strictly increasing for the whole process.
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// One completed refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshUpdate {
    pub generation: u64,
    pub results: Vec<FullWeatherData>,
}

pub struct FeaturedRefresher {
    cancel: CancellationToken,
    trigger: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl FeaturedRefresher {
    /// Spawn the refresh loop on `runtime`.
    ///
    /// The first cycle starts immediately. With `period` of `None` only that
    /// first cycle and manual [`refresh_now`](Self::refresh_now) triggers run.
    pub fn start<S, F>(
        runtime: &Handle,
        source: Arc<S>,
        cities: Vec<String>,
        period: Option<Duration>,
        mut on_update: F,
    ) -> Self
    where
        S: WeatherSource + ?Sized + 'static,
        F: FnMut(RefreshUpdate) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let trigger = Arc::new(Notify::new());

        let task_cancel = cancel.clone();
        let task_trigger = trigger.clone();
        let period = period.filter(|p| !p.is_zero());

        let task = runtime.spawn(async move {
            tracing::info!(
                "Featured refresh started ({} cities, period {:?})",
                cities.len(),
                period
            );

            let mut ticker = period.map(|p| {
                let mut ticker = interval_at(Instant::now() + p, p);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

            loop {
                let generation = next_generation();
                let results = tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    results = fetch_featured(source.as_ref(), &cities) => results,
                };
                if task_cancel.is_cancelled() {
                    break;
                }

                tracing::info!(
                    "Featured refresh {} delivered {} cities",
                    generation,
                    results.len()
                );
                on_update(RefreshUpdate {
                    generation,
                    results,
                });

                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = task_trigger.notified() => {
                        tracing::debug!("Manual featured refresh requested");
                    }
                    _ = next_tick(&mut ticker) => {}
                }
            }

            tracing::info!("Featured refresh stopped");
        });

        Self {
            cancel,
            trigger,
            task: Some(task),
        }
    }

    /// Run another cycle as soon as the current one (if any) finishes
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop. A cycle in progress is abandoned without delivering.
    pub fn stop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
        }
        self.task.take();
    }

    /// Stop and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Featured refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for FeaturedRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
