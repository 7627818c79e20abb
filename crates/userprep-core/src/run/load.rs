use polars::chunked_array::cast::CastOptions;
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};

use crate::checks::{cast_mismatch_counts, CastMismatch};
use crate::config::{parse_data_type, CastMode};
use crate::errors::RunError;
use crate::io::read::csv::read_raw_csv;
use crate::mapping::{load_type_mapping, TypeMapping};
use crate::{warnings, PrepResult};

use super::context::RunContext;
use super::temporal::{cast_string_to_temporal, is_temporal};

pub(crate) struct LoadedTable {
    pub df: DataFrame,
    pub mapping: TypeMapping,
    pub rows_read: u64,
    pub cast_nulls: Vec<CastMismatch>,
}

/// Fetch the mapping and the csv, swap name/email, then project and cast.
pub(crate) fn load_typed_table(ctx: &RunContext) -> PrepResult<LoadedTable> {
    let mapping_path = ctx
        .client
        .download_to_temp(&ctx.mapping.uri, ctx.scratch_dir())?;
    let mapping = load_type_mapping(&mapping_path)?;
    log::info!(
        "mapping loaded from {}: {} columns",
        ctx.mapping.uri,
        mapping.len()
    );

    let input_path = ctx.client.download_to_temp(&ctx.input.uri, ctx.scratch_dir())?;
    let mut raw = read_raw_csv(&input_path, &ctx.source_options())?;
    let rows_read = raw.height() as u64;
    log::info!("read {rows_read} rows from {}", ctx.input.uri);

    let header = raw
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    let swapped = swapped_column_names(&header)?;
    raw.set_column_names(swapped.iter())
        .map_err(|err| Box::new(RunError(format!("failed to rename input columns: {err}"))))?;

    let (df, cast_nulls) = project_and_cast(&raw, &mapping, ctx.cast_mode)?;
    Ok(LoadedTable {
        df,
        mapping,
        rows_read,
        cast_nulls,
    })
}

/// Header with the `name` and `email` labels exchanged.
pub fn swapped_column_names(header: &[String]) -> PrepResult<Vec<String>> {
    for required in ["name", "email"] {
        if !header.iter().any(|column| column == required) {
            return Err(Box::new(RunError(format!(
                "column {required} not found in input"
            ))));
        }
    }
    Ok(header
        .iter()
        .map(|column| match column.as_str() {
            "name" => "email".to_string(),
            "email" => "name".to_string(),
            _ => column.clone(),
        })
        .collect())
}

/// Keep exactly the mapping's columns, in mapping order, cast to their types.
///
/// Returns the per-column counts of values that became null in the cast. In
/// strict mode any such value fails instead.
pub fn project_and_cast(
    raw: &DataFrame,
    mapping: &TypeMapping,
    cast_mode: CastMode,
) -> PrepResult<(DataFrame, Vec<CastMismatch>)> {
    let missing = mapping
        .iter()
        .filter(|entry| raw.get_column_index(&entry.column).is_none())
        .map(|entry| entry.column.clone())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(Box::new(RunError(format!(
            "mapped columns not found in input: {}",
            missing.join(", ")
        ))));
    }

    let projected = raw
        .select(mapping.column_names())
        .map_err(|err| Box::new(RunError(format!("failed to project input columns: {err}"))))?;
    let mut typed = projected.clone();
    for entry in mapping.iter() {
        let dtype = parse_data_type(&entry.type_name)?;
        if dtype == DataType::String {
            continue;
        }
        let column = typed.column(&entry.column).map_err(|err| {
            Box::new(RunError(format!(
                "column {} not found for cast: {err}",
                entry.column
            )))
        })?;
        let is_string = column.dtype() == &DataType::String;
        let casted = if dtype == DataType::Boolean && is_string {
            cast_string_to_bool(&entry.column, column)?
        } else if is_temporal(&dtype) && is_string {
            cast_string_to_temporal(&entry.column, column, &dtype)?
        } else {
            let source = if is_string {
                trim_string_values(&entry.column, column)?
            } else {
                column.clone()
            };
            source
                .cast_with_options(&dtype, CastOptions::NonStrict)
                .map_err(|err| {
                    Box::new(RunError(format!(
                        "failed to cast column {} to {}: {err}",
                        entry.column, entry.type_name
                    )))
                })?
        };
        let idx = typed.get_column_index(&entry.column).ok_or_else(|| {
            Box::new(RunError(format!(
                "column {} not found for update",
                entry.column
            )))
        })?;
        typed.replace_column(idx, casted).map_err(|err| {
            Box::new(RunError(format!(
                "failed to update column {}: {err}",
                entry.column
            )))
        })?;
    }

    let cast_nulls = cast_mismatch_counts(&projected, &typed, mapping)?;
    match cast_mode {
        CastMode::Strict => {
            if let Some(first) = cast_nulls.first() {
                return Err(Box::new(RunError(format!(
                    "column {}: {} value(s) failed to cast to {}",
                    first.column, first.count, first.type_name
                ))));
            }
        }
        CastMode::Coerce => {
            for mismatch in &cast_nulls {
                warnings::emit(&format!(
                    "column {}: {} value(s) could not be cast to {} and were set to null",
                    mismatch.column, mismatch.count, mismatch.type_name
                ));
            }
        }
    }
    Ok((typed, cast_nulls))
}

fn trim_string_values(name: &str, column: &Column) -> PrepResult<Column> {
    let string_values = column.as_materialized_series().str().map_err(|err| {
        Box::new(RunError(format!(
            "failed to read column {name} as string: {err}"
        )))
    })?;
    let values = string_values
        .into_iter()
        .map(|value| value.map(str::trim))
        .collect::<Vec<_>>();
    Ok(Series::new(name.into(), values).into())
}

fn cast_string_to_bool(name: &str, column: &Column) -> PrepResult<Column> {
    let string_values = column.as_materialized_series().str().map_err(|err| {
        Box::new(RunError(format!(
            "failed to read boolean column {name} as string: {err}"
        )))
    })?;
    let values = string_values
        .into_iter()
        .map(|value| {
            value.and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            })
        })
        .collect::<Vec<_>>();
    Ok(Series::new(name.into(), values).into())
}
