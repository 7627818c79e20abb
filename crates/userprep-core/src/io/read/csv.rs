use std::path::Path;
use std::sync::Arc;

use polars::prelude::{DataFrame, DataType, Schema, SerReader};

use crate::errors::RunError;
use crate::{config, PrepResult};

#[derive(Debug, Clone)]
pub struct CsvReadPlan {
    pub schema: Schema,
}

impl CsvReadPlan {
    /// Every column read as text; typing happens afterwards.
    pub fn raw(columns: &[String]) -> Self {
        Self {
            schema: build_raw_schema(columns),
        }
    }
}

pub fn read_csv_file(
    input_path: &Path,
    source_options: &config::SourceOptions,
    plan: &CsvReadPlan,
) -> PrepResult<DataFrame> {
    let read_options = source_options
        .to_csv_read_options(input_path)?
        .with_schema(Some(Arc::new(plan.schema.clone())));
    let reader = read_options
        .try_into_reader_with_file_path(None)
        .map_err(|err| open_error(input_path, err))?;
    let df = reader.finish().map_err(|err| {
        Box::new(RunError(format!(
            "csv read failed for {}: {err}",
            input_path.display()
        ))) as Box<dyn std::error::Error + Send + Sync>
    })?;
    Ok(df)
}

pub fn read_csv_header(
    input_path: &Path,
    source_options: &config::SourceOptions,
) -> PrepResult<Vec<String>> {
    let read_options = source_options
        .to_csv_read_options(input_path)?
        .with_n_rows(Some(0));
    let reader = read_options
        .try_into_reader_with_file_path(None)
        .map_err(|err| open_error(input_path, err))?;
    let df = reader.finish().map_err(|err| {
        Box::new(RunError(format!(
            "csv header read failed for {}: {err}",
            input_path.display()
        ))) as Box<dyn std::error::Error + Send + Sync>
    })?;
    Ok(df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect())
}

/// Header, then the full file with every column as a string.
pub fn read_raw_csv(
    input_path: &Path,
    source_options: &config::SourceOptions,
) -> PrepResult<DataFrame> {
    let columns = read_csv_header(input_path, source_options)?;
    read_csv_file(input_path, source_options, &CsvReadPlan::raw(&columns))
}

fn build_raw_schema(columns: &[String]) -> Schema {
    let mut schema = Schema::with_capacity(columns.len());
    for name in columns {
        schema.insert(name.as_str().into(), DataType::String);
    }
    schema
}

fn open_error(
    input_path: &Path,
    err: impl std::fmt::Display,
) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(RunError(format!(
        "failed to open csv at {}: {err}",
        input_path.display()
    )))
}
