use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{aggregate, DEFAULT_AGGREGATE_PARALLELISM};
use crate::calculate::compute;
use crate::client::ForecastClient;
use crate::error::SelectError;
use crate::fetch::{fetch_all, CityEndpoint, FetchFailure, DEFAULT_FETCH_WORKERS};
use crate::forecast::CityAggregateRow;
use crate::reduce::ReduceSettings;
use crate::select::select_best;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub fetch_workers: usize,
    pub aggregate_parallelism: usize,
    pub reduce: ReduceSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fetch_workers: DEFAULT_FETCH_WORKERS,
            aggregate_parallelism: DEFAULT_AGGREGATE_PARALLELISM,
            reduce: ReduceSettings::default(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PipelineReport {
    pub generated_at_utc: String,
    pub best: Vec<String>,
    pub table: Vec<CityAggregateRow>,
    /// Cities whose forecast could not be fetched.
    pub failed_fetches: Vec<FetchFailure>,
    /// Cities that reached the calculation stage but produced no daily stats.
    pub empty_cities: Vec<String>,
}

/// Fetch, reduce, aggregate and select, each stage finishing before the next
/// starts. Fails only when no city produced any data.
pub async fn run<C>(
    client: &C,
    cities: &[CityEndpoint],
    settings: &PipelineSettings,
) -> Result<PipelineReport, SelectError>
where
    C: ForecastClient + ?Sized,
{
    info!(cities = cities.len(), "starting weather analysis");

    let fetched = fetch_all(client, cities, settings.fetch_workers).await;

    let names: Vec<String> = cities.iter().map(|c| c.name.clone()).collect();
    let analytics = compute(
        Arc::new(fetched.forecasts),
        &names,
        Arc::new(settings.reduce.clone()),
    )
    .await;

    let empty_cities: Vec<String> = names
        .iter()
        .filter(|n| !analytics.contains_key(*n))
        .filter(|n| !fetched.failures.iter().any(|f| &f.city == *n))
        .cloned()
        .collect();
    for city in &empty_cities {
        warn!(city = %city, "no complete forecast days");
    }

    let table = aggregate(&analytics, settings.aggregate_parallelism).await;
    let best = select_best(&table)?;

    Ok(PipelineReport {
        generated_at_utc: Utc::now().format("%d-%m-%Y %H:%M").to_string(),
        best,
        table,
        failed_fetches: fetched.failures,
        empty_cities,
    })
}
