use crate::config::{parse_data_type, parse_encoding, parse_separator, JobConfig};
use crate::io::write::parquet::parse_parquet_compression;
use crate::{ConfigError, PrepResult};

const ALLOWED_STORAGE_TYPES: &[&str] = &["local", "s3"];

pub(crate) fn validate_config(config: &JobConfig) -> PrepResult<()> {
    if config.version.trim().is_empty() {
        return Err(Box::new(ConfigError("version is required".to_string())));
    }
    validate_storage(config)?;
    validate_source(config)?;
    validate_sink(config)?;
    validate_dedup(config)?;
    if let Some(report) = &config.report {
        require_path("report.path", &report.path)?;
    }
    Ok(())
}

fn validate_storage(config: &JobConfig) -> PrepResult<()> {
    let storage = &config.storage;
    if !ALLOWED_STORAGE_TYPES.contains(&storage.fs_type.as_str()) {
        return Err(Box::new(ConfigError(format!(
            "storage.type={} is unsupported (allowed: {})",
            storage.fs_type,
            ALLOWED_STORAGE_TYPES.join(", ")
        ))));
    }
    if storage.fs_type == "s3"
        && storage
            .bucket
            .as_deref()
            .map(|bucket| bucket.trim().is_empty())
            .unwrap_or(true)
    {
        return Err(Box::new(ConfigError(
            "storage.bucket is required for type s3".to_string(),
        )));
    }
    if storage.fs_type == "local" && storage.bucket.is_some() {
        return Err(Box::new(ConfigError(
            "storage.bucket is only valid for type s3".to_string(),
        )));
    }
    Ok(())
}

fn validate_source(config: &JobConfig) -> PrepResult<()> {
    require_path("source.path", &config.source.path)?;
    require_path("mapping.path", &config.mapping.path)?;
    config.source.cast_mode()?;
    if let Some(options) = &config.source.options {
        if let Some(separator) = &options.separator {
            parse_separator(separator)?;
        }
        parse_encoding(options.encoding.as_deref())?;
    }
    Ok(())
}

fn validate_sink(config: &JobConfig) -> PrepResult<()> {
    require_path("sink.path", &config.sink.path)?;
    if let Some(options) = &config.sink.options {
        if let Some(compression) = &options.compression {
            parse_parquet_compression(compression)?;
        }
        if options.row_group_size == Some(0) {
            return Err(Box::new(ConfigError(
                "sink.options.row_group_size must be greater than 0".to_string(),
            )));
        }
    }
    if config.sink.path.trim_end_matches('/') == config.source.path.trim_end_matches('/') {
        return Err(Box::new(ConfigError(
            "sink.path must differ from source.path".to_string(),
        )));
    }
    Ok(())
}

fn validate_dedup(config: &JobConfig) -> PrepResult<()> {
    let dedup = &config.dedup;
    if dedup.key.trim().is_empty() {
        return Err(Box::new(ConfigError("dedup.key cannot be empty".to_string())));
    }
    if dedup.order_by.trim().is_empty() {
        return Err(Box::new(ConfigError(
            "dedup.order_by cannot be empty".to_string(),
        )));
    }
    if dedup.key == dedup.order_by {
        return Err(Box::new(ConfigError(format!(
            "dedup.key and dedup.order_by must differ (both are {})",
            dedup.key
        ))));
    }
    Ok(())
}

fn require_path(field: &str, value: &str) -> PrepResult<()> {
    if value.trim().is_empty() {
        return Err(Box::new(ConfigError(format!("{field} cannot be empty"))));
    }
    Ok(())
}

/// Type names from a mapping document are only known at run time; this is the
/// same check applied to each of them before any cast happens.
pub(crate) fn validate_type_name(column: &str, type_name: &str) -> PrepResult<()> {
    parse_data_type(type_name).map(|_| ()).map_err(|err| {
        Box::new(ConfigError(format!("mapping column {column}: {err}")))
            as Box<dyn std::error::Error + Send + Sync>
    })
}
