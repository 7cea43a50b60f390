use tracing::info;

use crate::error::SelectError;
use crate::forecast::CityAggregateRow;

/// Cities sharing the highest cumulative rank, in table order.
pub fn select_best(rows: &[CityAggregateRow]) -> Result<Vec<String>, SelectError> {
    let max_rank = rows
        .iter()
        .map(|r| r.cumulative_rank)
        .max()
        .ok_or(SelectError::EmptyInput)?;

    let best: Vec<String> = rows
        .iter()
        .filter(|r| r.cumulative_rank == max_rank)
        .map(|r| r.city.clone())
        .collect();

    info!(max_rank, best = ?best, "selected best cities");
    Ok(best)
}
