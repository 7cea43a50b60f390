use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, Instrument};

use crate::forecast::{CityAnalytics, DailyStat, RawForecast};
use crate::reduce::{reduce_city, ReduceSettings};

/// Number of reducer jobs allowed to run at once.
pub fn compute_width() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Reduce every named city's payload to daily stats in parallel.
///
/// Cities missing from `forecasts` are still dispatched and simply come back
/// empty. Empty results are not inserted into the returned map.
pub async fn compute(
    forecasts: Arc<HashMap<String, RawForecast>>,
    cities: &[String],
    settings: Arc<ReduceSettings>,
) -> CityAnalytics {
    compute_with(cities, compute_width(), move |city| {
        reduce_city(&forecasts, city, &settings)
    })
    .await
}

/// Runs `reducer` once per distinct city on the blocking pool, at most
/// `width` at a time. A reducer that panics counts as an empty result.
pub async fn compute_with<F>(cities: &[String], width: usize, reducer: F) -> CityAnalytics
where
    F: Fn(&str) -> Vec<DailyStat> + Send + Sync + 'static,
{
    let cities: BTreeSet<&String> = cities.iter().collect();
    let span = info_span!("calculate", cities = cities.len(), width);

    async move {
        let permits = Arc::new(Semaphore::new(width.max(1)));
        let reducer = Arc::new(reducer);
        let mut tasks = JoinSet::new();

        for city in cities {
            let city = city.clone();
            let permits = permits.clone();
            let reducer = reducer.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let name = city.clone();
                let stats = tokio::task::spawn_blocking(move || reducer(&name)).await;
                (city, stats)
            });
        }

        let mut analytics = CityAnalytics::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((city, Ok(stats))) if stats.is_empty() => {
                    debug!(city = %city, "no daily stats");
                }
                Ok((city, Ok(stats))) => {
                    analytics.insert(city, stats);
                }
                Ok((city, Err(e))) => {
                    error!(city = %city, error = %e, "failed calculating daily stats");
                }
                Err(e) => {
                    error!(error = %e, "calculation task aborted");
                }
            }
        }

        info!(cities_with_data = analytics.len(), "calculation stage finished");
        analytics
    }
    .instrument(span)
    .await
}
