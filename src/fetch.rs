use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, Instrument};

use crate::client::ForecastClient;
use crate::forecast::RawForecast;

/// Default width of the fetch pool.
pub const DEFAULT_FETCH_WORKERS: usize = 5;

/// One entry of the city registry: display name and request URL.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CityEndpoint {
    pub name: String,
    pub url: String,
}

impl CityEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub city: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successfully fetched payloads. Failed cities are absent.
    pub forecasts: HashMap<String, RawForecast>,
    pub failures: Vec<FetchFailure>,
}

/// Fetch every city's forecast with at most `workers` requests in flight.
///
/// Completion order is arbitrary. A failed city is logged, recorded in
/// `failures` and left out of `forecasts`; it never stops the others.
/// Returns once every job has either succeeded or failed.
pub async fn fetch_all<C>(client: &C, cities: &[CityEndpoint], workers: usize) -> FetchOutcome
where
    C: ForecastClient + ?Sized,
{
    let workers = workers.max(1);
    let span = info_span!("fetch", cities = cities.len(), workers);

    async move {
        let results = stream::iter(cities)
            .map(|city| async move {
                debug!(city = %city.name, url = %city.url, "requesting forecast");
                (city, client.fetch_forecast(&city.url).await)
            })
            .buffer_unordered(workers)
            .collect::<Vec<_>>()
            .await;

        // Results are merged after the barrier, one writer per city key.
        let mut outcome = FetchOutcome::default();
        for (city, result) in results {
            match result {
                Ok(raw) => {
                    outcome.forecasts.insert(city.name.clone(), raw);
                }
                Err(e) => {
                    error!(city = %city.name, error = %e, "failed fetching forecast");
                    outcome.failures.push(FetchFailure {
                        city: city.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            fetched = outcome.forecasts.len(),
            failed = outcome.failures.len(),
            "fetch stage finished"
        );
        outcome
    }
    .instrument(span)
    .await
}
