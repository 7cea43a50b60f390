use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/* ============================ Raw payload ============================ */

/// Forecast payload for one city exactly as the client returned it.
///
/// Kept as untyped JSON: shape problems are the reducer's to detect and
/// report, not the fetcher's.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecast(pub serde_json::Value);

impl RawForecast {
    /// Typed view over the payload. Fails when `forecasts` is missing or any
    /// day/hour record has the wrong shape.
    pub fn extract(&self) -> Result<ForecastDoc, serde_json::Error> {
        ForecastDoc::deserialize(&self.0)
    }
}

impl From<serde_json::Value> for RawForecast {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ForecastDoc {
    pub forecasts: Vec<DayForecast>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DayForecast {
    pub date: String,
    #[serde(default)]
    pub hours: Vec<HourRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HourRecord {
    #[serde(deserialize_with = "hour_from_str_or_int")]
    pub hour: u8,
    pub temp: f64,
    pub condition: String,
}

/// The API sends `"hour": "9"`; test fixtures and other feeds send `9`.
fn hour_from_str_or_int<'de, D>(de: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hour {
        Int(u8),
        Text(String),
    }

    match Hour::deserialize(de)? {
        Hour::Int(h) => Ok(h),
        Hour::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("hour {s:?}: {e}"))),
    }
}

/* ============================ Derived stats ============================ */

/// Daytime summary of one complete forecast day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyStat {
    pub date: String,
    pub avg_temp: f64,
    pub good_hours: u32,
}

/// Per-city daily stats. A city with no stats has no entry at all.
pub type CityAnalytics = BTreeMap<String, Vec<DailyStat>>;

/// One row of the ranked table handed to the result sink.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CityAggregateRow {
    pub city: String,
    pub avg_temp: f64,
    pub good_hours_total: u32,
    pub rank_temp: u32,
    pub rank_good_hours: u32,
    pub cumulative_rank: u32,
}
