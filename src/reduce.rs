use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::forecast::{DailyStat, DayForecast, RawForecast};

/// Hours a forecast day must carry before it is trusted.
pub const HOURS_PER_DAY: usize = 24;

/// Sky conditions counted as good weather.
pub const DEFAULT_GOOD_CONDITIONS: [&str; 4] = ["partly-cloud", "clear", "cloudy", "overcast"];

/// Inclusive range of hours that make up the day's statistics.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaytimeWindow {
    pub from: u8,
    pub to: u8,
}

impl Default for DaytimeWindow {
    fn default() -> Self {
        Self { from: 9, to: 19 }
    }
}

impl DaytimeWindow {
    pub fn contains(&self, hour: u8) -> bool {
        (self.from..=self.to).contains(&hour)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReduceSettings {
    pub window: DaytimeWindow,
    pub good_conditions: Vec<String>,
}

impl Default for ReduceSettings {
    fn default() -> Self {
        Self {
            window: DaytimeWindow::default(),
            good_conditions: DEFAULT_GOOD_CONDITIONS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ReduceSettings {
    fn is_good(&self, condition: &str) -> bool {
        self.good_conditions.iter().any(|c| c == condition)
    }
}

/// Daily stats for `city`, looked up in the fetched payloads.
///
/// A missing city or a payload without a usable `forecasts` list is logged
/// and yields no stats.
pub fn reduce_city(
    forecasts: &HashMap<String, RawForecast>,
    city: &str,
    settings: &ReduceSettings,
) -> Vec<DailyStat> {
    let Some(raw) = forecasts.get(city) else {
        error!(city = %city, "failed forecasts data extraction: no payload");
        return Vec::new();
    };

    match reduce_forecast(raw, settings) {
        Ok(stats) => stats,
        Err(e) => {
            error!(city = %city, error = %e, "failed forecasts data extraction");
            Vec::new()
        }
    }
}

/// Daily stats for every complete day of one payload, in payload order.
pub fn reduce_forecast(
    raw: &RawForecast,
    settings: &ReduceSettings,
) -> Result<Vec<DailyStat>, serde_json::Error> {
    let doc = raw.extract()?;
    Ok(doc
        .forecasts
        .iter()
        .filter_map(|day| summarize_day(day, settings))
        .collect())
}

/// `None` for incomplete days and for days with nothing inside the window.
pub fn summarize_day(day: &DayForecast, settings: &ReduceSettings) -> Option<DailyStat> {
    if day.hours.len() < HOURS_PER_DAY {
        debug!(date = %day.date, hours = day.hours.len(), "skipping incomplete day");
        return None;
    }

    let daytime: Vec<_> = day
        .hours
        .iter()
        .filter(|h| settings.window.contains(h.hour))
        .collect();
    if daytime.is_empty() {
        return None;
    }

    let avg_temp = daytime.iter().map(|h| h.temp).sum::<f64>() / daytime.len() as f64;
    let good_hours = daytime.iter().filter(|h| settings.is_good(&h.condition)).count() as u32;

    Some(DailyStat {
        date: day.date.clone(),
        avg_temp,
        good_hours,
    })
}
