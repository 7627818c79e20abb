use std::path::Path;

use polars::polars_utils::pl_str::PlSmallStr;
use polars::prelude::{CsvEncoding, CsvParseOptions, CsvReadOptions, DataType, NullValues, TimeUnit};

use crate::{ConfigError, PrepResult};

pub const DEFAULT_VERSION: &str = "0.1";
pub const DEFAULT_BUCKET: &str = "teste-eng-dados";
pub const DEFAULT_INPUT_PATH: &str = "data/input/users/load.csv";
pub const DEFAULT_MAPPING_PATH: &str = "config/types_mapping.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/output/output.parquet";
pub const DEFAULT_DEDUP_KEY: &str = "id";
pub const DEFAULT_DEDUP_ORDER_BY: &str = "update_date";

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub version: String,
    pub storage: StorageDefinition,
    pub source: SourceConfig,
    pub mapping: MappingConfig,
    pub sink: SinkConfig,
    pub dedup: DedupConfig,
    pub report: Option<ReportConfig>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            storage: StorageDefinition::default(),
            source: SourceConfig::default(),
            mapping: MappingConfig::default(),
            sink: SinkConfig::default(),
            dedup: DedupConfig::default(),
            report: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageDefinition {
    pub fs_type: String,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub prefix: Option<String>,
}

impl StorageDefinition {
    pub fn local() -> Self {
        Self {
            fs_type: "local".to_string(),
            bucket: None,
            region: None,
            prefix: None,
        }
    }
}

impl Default for StorageDefinition {
    fn default() -> Self {
        Self {
            fs_type: "s3".to_string(),
            bucket: Some(DEFAULT_BUCKET.to_string()),
            region: None,
            prefix: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub path: String,
    pub options: Option<SourceOptions>,
    pub cast_mode: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_INPUT_PATH.to_string(),
            options: None,
            cast_mode: None,
        }
    }
}

impl SourceConfig {
    pub fn cast_mode(&self) -> PrepResult<CastMode> {
        match self.cast_mode.as_deref() {
            None | Some("coerce") => Ok(CastMode::Coerce),
            Some("strict") => Ok(CastMode::Strict),
            Some(other) => Err(Box::new(ConfigError(format!(
                "source.cast_mode={other} is unsupported (allowed: strict, coerce)"
            )))),
        }
    }
}

/// What happens to a value that cannot be cast to its mapped type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// The value becomes null and the run carries on with a warning.
    Coerce,
    /// The run fails.
    Strict,
}

impl CastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastMode::Coerce => "coerce",
            CastMode::Strict => "strict",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub separator: Option<String>,
    pub encoding: Option<String>,
    pub null_values: Option<Vec<String>>,
}

impl SourceOptions {
    pub fn to_csv_parse_options(&self) -> PrepResult<CsvParseOptions> {
        let separator = parse_separator(self.separator.as_deref().unwrap_or(","))?;
        let encoding = parse_encoding(self.encoding.as_deref())?;
        let null_values = build_null_values(self.null_values.as_ref());
        Ok(CsvParseOptions::default()
            .with_separator(separator)
            .with_encoding(encoding)
            .with_null_values(null_values))
    }

    pub fn to_csv_read_options(&self, input_path: &Path) -> PrepResult<CsvReadOptions> {
        let parse_options = self.to_csv_parse_options()?;

        Ok(CsvReadOptions::default()
            .with_path(Some(input_path))
            .with_has_header(true)
            .with_parse_options(parse_options))
    }
}

pub(crate) fn parse_separator(value: &str) -> PrepResult<u8> {
    let bytes = value.as_bytes();
    if bytes.len() != 1 {
        return Err(Box::new(ConfigError(format!(
            "separator must be a single byte, got {value:?}"
        ))));
    }
    Ok(bytes[0])
}

pub(crate) fn parse_encoding(value: Option<&str>) -> PrepResult<CsvEncoding> {
    let normalized = value
        .unwrap_or("utf8")
        .to_ascii_lowercase()
        .replace(['-', '_'], "");
    match normalized.as_str() {
        "utf8" => Ok(CsvEncoding::Utf8),
        "lossyutf8" => Ok(CsvEncoding::LossyUtf8),
        _ => Err(Box::new(ConfigError(format!(
            "unsupported encoding: {}",
            value.unwrap_or("utf8")
        )))),
    }
}

fn build_null_values(values: Option<&Vec<String>>) -> Option<NullValues> {
    let values = values?;
    if values.is_empty() {
        return None;
    }
    if values.len() == 1 {
        return Some(NullValues::AllColumnsSingle(PlSmallStr::from(
            values[0].as_str(),
        )));
    }
    Some(NullValues::AllColumns(
        values.iter().map(|value| value.as_str().into()).collect(),
    ))
}

#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub path: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MAPPING_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub path: String,
    pub options: Option<SinkOptions>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            options: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    pub compression: Option<String>,
    pub row_group_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub key: String,
    pub order_by: String,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_DEDUP_KEY.to_string(),
            order_by: DEFAULT_DEDUP_ORDER_BY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub path: String,
}

/// Resolve a mapping type name to a polars dtype.
///
/// Names follow the dataframe-engine vocabulary the mapping documents are
/// written against, so `integer` is 32-bit and `long` is 64-bit.
pub fn parse_data_type(value: &str) -> PrepResult<DataType> {
    let normalized = value.trim().to_ascii_lowercase().replace(['-', '_'], "");
    match normalized.as_str() {
        "string" | "str" | "text" => Ok(DataType::String),
        "boolean" | "bool" => Ok(DataType::Boolean),
        "byte" | "tinyint" | "int8" => Ok(DataType::Int8),
        "short" | "smallint" | "int16" => Ok(DataType::Int16),
        "integer" | "int" | "int32" => Ok(DataType::Int32),
        "long" | "bigint" | "int64" => Ok(DataType::Int64),
        "float" | "real" | "float32" => Ok(DataType::Float32),
        "double" | "float64" | "number" => Ok(DataType::Float64),
        "date" => Ok(DataType::Date),
        "timestamp" | "datetime" => Ok(DataType::Datetime(TimeUnit::Microseconds, None)),
        "time" => Ok(DataType::Time),
        _ => Err(Box::new(ConfigError(format!(
            "unsupported column type: {value}"
        )))),
    }
}

pub(crate) fn is_string_type(value: &str) -> bool {
    matches!(parse_data_type(value), Ok(DataType::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_type_uses_engine_widths() {
        assert_eq!(parse_data_type("integer").expect("integer"), DataType::Int32);
        assert_eq!(parse_data_type("Long").expect("long"), DataType::Int64);
        assert_eq!(parse_data_type("double").expect("double"), DataType::Float64);
        assert_eq!(
            parse_data_type("timestamp").expect("timestamp"),
            DataType::Datetime(TimeUnit::Microseconds, None)
        );
        assert_eq!(parse_data_type("big_int").expect("bigint"), DataType::Int64);
    }

    #[test]
    fn parse_data_type_rejects_unknown_names() {
        let err = parse_data_type("varchar(10)").expect_err("unknown type");
        assert!(err.to_string().contains("unsupported column type"));
        let err = parse_data_type("decimal").expect_err("fixed-point type");
        assert!(err.to_string().contains("unsupported column type: decimal"));
    }

    #[test]
    fn cast_mode_defaults_to_coerce() {
        let source = SourceConfig::default();
        assert_eq!(source.cast_mode().expect("cast mode"), CastMode::Coerce);

        let strict = SourceConfig {
            cast_mode: Some("strict".to_string()),
            ..SourceConfig::default()
        };
        assert_eq!(strict.cast_mode().expect("cast mode"), CastMode::Strict);
    }

    #[test]
    fn default_job_points_at_fixed_locations() {
        let job = JobConfig::default();
        assert_eq!(job.storage.fs_type, "s3");
        assert_eq!(job.storage.bucket.as_deref(), Some(DEFAULT_BUCKET));
        assert_eq!(job.source.path, DEFAULT_INPUT_PATH);
        assert_eq!(job.mapping.path, DEFAULT_MAPPING_PATH);
        assert_eq!(job.sink.path, DEFAULT_OUTPUT_PATH);
        assert_eq!(job.dedup.key, "id");
        assert_eq!(job.dedup.order_by, "update_date");
    }
}
