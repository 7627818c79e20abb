use polars::prelude::{BooleanChunked, DataFrame, DataType, NewChunkedArray, SortMultipleOptions};

use crate::errors::RunError;
use crate::PrepResult;

/// Keep one row per `key`: the one with the greatest `order_by`.
///
/// Rows are sorted by `key` ascending and `order_by` descending, nulls last,
/// with a stable sort, so among tied rows the earliest input row survives.
/// Null keys form a single group. The result stays sorted by `key`.
pub fn deduplicate_latest(df: &DataFrame, key: &str, order_by: &str) -> PrepResult<DataFrame> {
    for column in [key, order_by] {
        if df.get_column_index(column).is_none() {
            return Err(Box::new(RunError(format!(
                "column {column} not found in typed table"
            ))));
        }
    }

    let sorted = df
        .sort(
            vec![key, order_by],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true])
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .map_err(|err| Box::new(RunError(format!("failed to sort by {key}: {err}"))))?;

    let keys = sorted
        .column(key)
        .and_then(|column| column.cast(&DataType::String))
        .map_err(|err| Box::new(RunError(format!("failed to read column {key}: {err}"))))?;
    let keys = keys
        .str()
        .map_err(|err| Box::new(RunError(format!("failed to read column {key}: {err}"))))?;

    let mut mask = Vec::with_capacity(keys.len());
    let mut previous: Option<Option<&str>> = None;
    for current in keys.into_iter() {
        mask.push(previous != Some(current));
        previous = Some(current);
    }
    let mask = BooleanChunked::from_slice("keep".into(), &mask);
    let deduped = sorted
        .filter(&mask)
        .map_err(|err| Box::new(RunError(format!("failed to filter duplicates: {err}"))))?;
    Ok(deduped)
}
