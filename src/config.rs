use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::DEFAULT_AGGREGATE_PARALLELISM;
use crate::error::ConfigError;
use crate::fetch::{CityEndpoint, DEFAULT_FETCH_WORKERS};
use crate::pipeline::PipelineSettings;
use crate::reduce::{DaytimeWindow, ReduceSettings, DEFAULT_GOOD_CONDITIONS};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "WEATHER_RANK_CONFIG";

#[derive(Deserialize, Debug)]
pub struct Config {
    pub cities: Vec<CityEndpoint>,
    #[serde(default)]
    pub fetch: FetchCfg,
    #[serde(default)]
    pub analysis: AnalysisCfg,
}

#[derive(Deserialize, Debug)]
pub struct FetchCfg {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
pub struct AnalysisCfg {
    #[serde(default = "default_hour_from")]
    pub hour_from: u8,
    #[serde(default = "default_hour_to")]
    pub hour_to: u8,
    #[serde(default = "default_good_conditions")]
    pub good_conditions: Vec<String>,
    #[serde(default = "default_parallelism")]
    pub aggregate_parallelism: usize,
}

fn default_workers() -> usize { DEFAULT_FETCH_WORKERS }
fn default_timeout_secs() -> u64 { 10 }
fn default_hour_from() -> u8 { DaytimeWindow::default().from }
fn default_hour_to() -> u8 { DaytimeWindow::default().to }
fn default_parallelism() -> usize { DEFAULT_AGGREGATE_PARALLELISM }
fn default_good_conditions() -> Vec<String> {
    DEFAULT_GOOD_CONDITIONS.iter().map(|c| c.to_string()).collect()
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self { workers: default_workers(), timeout_secs: default_timeout_secs() }
    }
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            hour_from: default_hour_from(),
            hour_to: default_hour_to(),
            good_conditions: default_good_conditions(),
            aggregate_parallelism: default_parallelism(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cities.is_empty() {
            return Err(ConfigError::Invalid("cities list is empty".into()));
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.name.trim().is_empty() || city.url.trim().is_empty() {
                return Err(ConfigError::Invalid("city name and url must be non-empty".into()));
            }
            if !seen.insert(city.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate city {:?}", city.name)));
            }
        }

        if self.fetch.workers == 0 {
            return Err(ConfigError::Invalid("fetch.workers must be at least 1".into()));
        }
        if self.analysis.aggregate_parallelism == 0 {
            return Err(ConfigError::Invalid(
                "analysis.aggregate_parallelism must be at least 1".into(),
            ));
        }

        let (from, to) = (self.analysis.hour_from, self.analysis.hour_to);
        if from > 23 || to > 23 || from > to {
            return Err(ConfigError::Invalid(format!(
                "daytime window {from}..={to} must lie within 0..=23"
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            fetch_workers: self.fetch.workers,
            aggregate_parallelism: self.analysis.aggregate_parallelism,
            reduce: ReduceSettings {
                window: DaytimeWindow { from: self.analysis.hour_from, to: self.analysis.hour_to },
                good_conditions: self.analysis.good_conditions.clone(),
            },
        }
    }
}

/// Parse and validate a YAML config. `path` is only used in error messages.
pub fn parse_config(yaml: &str, path: &Path) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&s, path)
}

/// Search order: explicit path, `$WEATHER_RANK_CONFIG`, ./config/cities.yaml,
/// ./config.yaml, ~/.config/city-weather-rank/config.yaml
pub fn config_candidates(explicit: Option<PathBuf>, from_env: Option<PathBuf>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = explicit { candidates.push(p); }
    if let Some(p) = from_env { candidates.push(p); }
    candidates.push(PathBuf::from("./config/cities.yaml"));
    candidates.push(PathBuf::from("./config.yaml"));
    if let Some(mut d) = dirs::config_dir() {
        d.push("city-weather-rank/config.yaml");
        candidates.push(d);
    }
    candidates
}

pub fn load_config(explicit: Option<PathBuf>) -> Result<(PathBuf, Config), ConfigError> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    for path in config_candidates(explicit, from_env) {
        if path.exists() {
            let cfg = read_config(&path)?;
            return Ok((path, cfg));
        }
    }
    Err(ConfigError::NotFound)
}
