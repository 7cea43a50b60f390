use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use crate::forecast::{CityAggregateRow, CityAnalytics, DailyStat};

/// Default number of flatten batches.
pub const DEFAULT_AGGREGATE_PARALLELISM: usize = 5;

/// One city-day, as produced by the flatten phase.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub city: String,
    pub date: String,
    pub avg_temp: f64,
    pub good_hours: u32,
}

/// Build the ranked table: one row per city in `analytics`, sorted by city.
///
/// The flatten phase runs as `parallelism` contiguous batches on the blocking
/// pool; grouping and ranking happen once all batches are back.
pub async fn aggregate(analytics: &CityAnalytics, parallelism: usize) -> Vec<CityAggregateRow> {
    let span = info_span!("aggregate", cities = analytics.len(), parallelism);

    async move {
        let entries: Vec<(String, Vec<DailyStat>)> = analytics
            .iter()
            .map(|(city, stats)| (city.clone(), stats.clone()))
            .collect();

        let handles = batches(entries, parallelism)
            .into_iter()
            .map(|batch| tokio::task::spawn_blocking(move || flatten_batch(&batch)));

        let mut rows = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(batch_rows) => rows.extend(batch_rows),
                Err(e) => error!(error = %e, "flatten batch failed"),
            }
        }

        let table = reduce_rows(&rows);
        info!(rows = rows.len(), cities = table.len(), "aggregation stage finished");
        table
    }
    .instrument(span)
    .await
}

/// Split `items` into at most `parallelism` contiguous batches of
/// `ceil(len / parallelism)` items each.
pub fn batches<T>(items: Vec<T>, parallelism: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let parallelism = parallelism.max(1);
    let size = items.len().div_ceil(parallelism);

    let mut out = Vec::with_capacity(parallelism);
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        out.push(items.by_ref().take(size).collect());
    }
    out
}

/// Expand every `(city, stat)` pair of a batch into a flat row.
pub fn flatten_batch(batch: &[(String, Vec<DailyStat>)]) -> Vec<FlatRow> {
    batch
        .iter()
        .flat_map(|(city, stats)| {
            stats.iter().map(move |s| FlatRow {
                city: city.clone(),
                date: s.date.clone(),
                avg_temp: s.avg_temp,
                good_hours: s.good_hours,
            })
        })
        .collect()
}

/// Group rows by city (mean temperature, summed good hours) and rank them.
pub fn reduce_rows(rows: &[FlatRow]) -> Vec<CityAggregateRow> {
    let mut groups: BTreeMap<&str, (f64, usize, u32)> = BTreeMap::new();
    for row in rows {
        let g = groups.entry(row.city.as_str()).or_insert((0.0, 0, 0));
        g.0 += row.avg_temp;
        g.1 += 1;
        g.2 += row.good_hours;
    }

    let totals = groups
        .into_iter()
        .map(|(city, (temp_sum, days, good))| (city.to_string(), temp_sum / days as f64, good))
        .collect();
    rank_table(totals)
}

/// Rank `(city, avg_temp, good_hours_total)` triples. Both ranks are
/// ascending average ranks, truncated to integers before they are summed.
pub fn rank_table(totals: Vec<(String, f64, u32)>) -> Vec<CityAggregateRow> {
    let temps: Vec<f64> = totals.iter().map(|t| t.1).collect();
    let goods: Vec<f64> = totals.iter().map(|t| f64::from(t.2)).collect();
    let temp_ranks = average_ranks(&temps);
    let good_ranks = average_ranks(&goods);

    totals
        .into_iter()
        .zip(temp_ranks.into_iter().zip(good_ranks))
        .map(|((city, avg_temp, good_hours_total), (rt, rg))| {
            // Truncation toward zero: a 1.5 tie becomes 1.
            let rank_temp = rt.trunc() as u32;
            let rank_good_hours = rg.trunc() as u32;
            CityAggregateRow {
                city,
                avg_temp,
                good_hours_total,
                rank_temp,
                rank_good_hours,
                cumulative_rank: rank_temp + rank_good_hours,
            }
        })
        .collect()
}

/// 1-based ascending ranks; tied values share the mean of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(date: &str, avg_temp: f64, good_hours: u32) -> DailyStat {
        DailyStat { date: date.into(), avg_temp, good_hours }
    }

    fn row<'a>(table: &'a [CityAggregateRow], city: &str) -> &'a CityAggregateRow {
        table.iter().find(|r| r.city == city).unwrap()
    }

    #[test]
    fn batches_are_contiguous_and_ceil_sized() {
        let out = batches((1..=10).collect::<Vec<_>>(), 4);
        assert_eq!(out, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10]]);
    }

    #[test]
    fn fewer_items_than_batches() {
        let out = batches(vec!["a", "b"], 5);
        assert_eq!(out, vec![vec!["a"], vec!["b"]]);
        assert!(batches(Vec::<u8>::new(), 5).is_empty());
    }

    #[test]
    fn flatten_keeps_batch_order() {
        let batch = vec![
            ("City1".to_string(), vec![stat("2023-01-01", 10.5, 8), stat("2023-01-02", 8.2, 7)]),
            ("City2".to_string(), vec![stat("2023-03-01", 12.1, 9)]),
        ];

        let rows = flatten_batch(&batch);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            FlatRow { city: "City1".into(), date: "2023-01-02".into(), avg_temp: 8.2, good_hours: 7 }
        );
        assert_eq!(rows[2].city, "City2");
    }

    #[test]
    fn average_ranks_share_tied_positions() {
        assert_eq!(average_ranks(&[10.0, 10.0, 20.0]), vec![1.5, 1.5, 3.0]);
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
        assert_eq!(average_ranks(&[7.0, 7.0, 7.0]), vec![2.0, 2.0, 2.0]);
        assert!(average_ranks(&[]).is_empty());
    }

    #[test]
    fn tied_ranks_are_truncated() {
        let table = rank_table(vec![
            ("A".into(), 10.0, 5),
            ("B".into(), 10.0, 5),
            ("C".into(), 20.0, 1),
        ]);

        assert_eq!(row(&table, "A").rank_temp, 1);
        assert_eq!(row(&table, "B").rank_temp, 1);
        assert_eq!(row(&table, "C").rank_temp, 3);
        assert_eq!(row(&table, "A").rank_good_hours, 2);
        assert_eq!(row(&table, "C").rank_good_hours, 1);
        assert_eq!(row(&table, "A").cumulative_rank, 3);
        assert_eq!(row(&table, "C").cumulative_rank, 4);
    }

    #[tokio::test]
    async fn aggregates_means_and_sums_per_city() {
        let mut analytics = CityAnalytics::new();
        analytics.insert(
            "City1".into(),
            vec![stat("2023-01-01", 10.5, 8), stat("2023-01-02", 8.2, 7)],
        );
        analytics.insert(
            "City2".into(),
            vec![stat("2023-03-01", 12.1, 9), stat("2023-01-02", 9.8, 6)],
        );

        let table = aggregate(&analytics, 2).await;

        assert_eq!(table.len(), 2);
        let c1 = row(&table, "City1");
        let c2 = row(&table, "City2");
        assert!((c1.avg_temp - 9.35).abs() < 1e-9);
        assert!((c2.avg_temp - 10.95).abs() < 1e-9);
        assert_eq!(c1.good_hours_total, 15);
        assert_eq!(c2.good_hours_total, 15);
        assert_eq!((c1.rank_temp, c2.rank_temp), (1, 2));
        // 15 vs 15 ties at 1.5 and truncates to 1 for both.
        assert_eq!((c1.rank_good_hours, c2.rank_good_hours), (1, 1));
        assert_eq!((c1.cumulative_rank, c2.cumulative_rank), (2, 3));
    }

    #[tokio::test]
    async fn parallelism_does_not_change_the_table() {
        let mut analytics = CityAnalytics::new();
        for i in 0..9u32 {
            analytics.insert(
                format!("C{i}"),
                vec![stat("d1", f64::from(i), i % 4), stat("d2", f64::from(i) + 1.0, 2)],
            );
        }

        let one = aggregate(&analytics, 1).await;
        let many = aggregate(&analytics, 5).await;

        assert_eq!(one, many);
        assert_eq!(one.len(), 9);
    }

    #[tokio::test]
    async fn empty_analytics_gives_empty_table() {
        assert!(aggregate(&CityAnalytics::new(), 5).await.is_empty());
    }
}
