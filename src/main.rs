// Packages
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use city_weather_rank::config::load_config;
use city_weather_rank::output::{report_json, write_report, write_table_csv};
use city_weather_rank::{run, HttpForecastClient};

/// Fetches hourly forecasts for the configured cities and reports the city
/// with the warmest, sunniest daytime hours.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to YAML config. Search order if not given:
    /// $WEATHER_RANK_CONFIG, ./config/cities.yaml, ./config.yaml,
    /// ~/.config/city-weather-rank/config.yaml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here (pretty). If omitted, it is printed to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the ranked table as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

/* ============================ Main ============================ */

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (path, cfg) = load_config(args.config)?;
    tracing::info!(config = %path.display(), cities = cfg.cities.len(), "loaded config");

    let client = HttpForecastClient::new(cfg.timeout()).context("building HTTP client")?;
    let report = run(&client, &cfg.cities, &cfg.settings()).await?;

    tracing::info!(best = ?report.best, "best cities for a trip");

    if let Some(path) = &args.csv {
        write_table_csv(&report.table, path)
            .with_context(|| format!("writing table to {}", path.display()))?;
    }

    if let Some(path) = &args.out {
        write_report(&report, path)
            .with_context(|| format!("writing report to {}", path.display()))?;
    } else {
        println!("{}", report_json(&report)?);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}
