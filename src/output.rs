use std::path::Path;

use crate::error::OutputError;
use crate::forecast::CityAggregateRow;
use crate::pipeline::PipelineReport;

pub fn report_json(report: &PipelineReport) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_report(report: &PipelineReport, path: &Path) -> Result<(), OutputError> {
    let json = report_json(report)?;
    std::fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Ranked table as CSV with a header row, one line per city.
pub fn write_table_csv(rows: &[CityAggregateRow], path: &Path) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CityAggregateRow> {
        vec![
            CityAggregateRow {
                city: "A".into(),
                avg_temp: 15.0,
                good_hours_total: 8,
                rank_temp: 2,
                rank_good_hours: 1,
                cumulative_rank: 3,
            },
            CityAggregateRow {
                city: "B".into(),
                avg_temp: 12.5,
                good_hours_total: 10,
                rank_temp: 1,
                rank_good_hours: 2,
                cumulative_rank: 3,
            },
        ]
    }

    #[test]
    fn csv_has_table_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather-stats.csv");

        write_table_csv(&rows(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("city,avg_temp,good_hours_total,rank_temp,rank_good_hours,cumulative_rank")
        );
        assert_eq!(lines.next(), Some("A,15.0,8,2,1,3"));
        assert_eq!(lines.next(), Some("B,12.5,10,1,2,3"));
    }

    #[test]
    fn json_report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = PipelineReport {
            generated_at_utc: "19-10-2026 12:00".into(),
            best: vec!["A".into(), "B".into()],
            table: rows(),
            failed_fetches: Vec::new(),
            empty_cities: vec!["C".into()],
        };

        write_report(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["best"], serde_json::json!(["A", "B"]));
        assert_eq!(value["table"][1]["good_hours_total"], 10);
        assert_eq!(value["empty_cities"][0], "C");
    }
}
