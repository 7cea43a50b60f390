//! Ranks cities by daytime warmth and good-weather hours.
//!
//! Four stages run one after another: fetch every city's forecast, reduce
//! each forecast to daily stats, aggregate and rank the cities, then pick the
//! best one (or the tied best ones).

pub mod aggregate;
pub mod calculate;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod output;
pub mod pipeline;
pub mod reduce;
pub mod select;

pub use client::{ForecastClient, HttpForecastClient};
pub use error::{ConfigError, FetchError, OutputError, SelectError};
pub use fetch::CityEndpoint;
pub use forecast::{CityAggregateRow, CityAnalytics, DailyStat, RawForecast};
pub use pipeline::{run, PipelineReport, PipelineSettings};
