use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::config::is_string_type;
use crate::errors::RunError;
use crate::mapping::TypeMapping;
use crate::PrepResult;

/// Values of one column that were present in the input but did not survive
/// the cast to the mapped type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMismatch {
    pub column: String,
    pub count: u64,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A raw value that exists while the typed value is null counts as a cast
/// failure. String columns never fail.
pub fn cast_mismatch_counts(
    raw_df: &DataFrame,
    typed_df: &DataFrame,
    mapping: &TypeMapping,
) -> PrepResult<Vec<CastMismatch>> {
    if typed_df.height() == 0 {
        return Ok(Vec::new());
    }

    let mut counts = Vec::new();
    for entry in mapping.iter() {
        if is_string_type(&entry.type_name) {
            continue;
        }
        let raw = raw_df
            .column(&entry.column)
            .map_err(|err| {
                Box::new(RunError(format!(
                    "raw column {} not found: {err}",
                    entry.column
                )))
            })?
            .str()
            .map_err(|err| {
                Box::new(RunError(format!(
                    "raw column {} is not utf8: {err}",
                    entry.column
                )))
            })?;
        let typed_nulls = typed_df
            .column(&entry.column)
            .map_err(|err| {
                Box::new(RunError(format!(
                    "typed column {} not found: {err}",
                    entry.column
                )))
            })?
            .is_null();

        let raw_not_null = raw.is_not_null();
        let violations = (&typed_nulls & &raw_not_null).sum().unwrap_or(0) as u64;
        if violations > 0 {
            counts.push(CastMismatch {
                column: entry.column.clone(),
                count: violations,
                type_name: entry.type_name.clone(),
            });
        }
    }
    Ok(counts)
}
