use std::path::Path;

use yaml_rust2::yaml::Hash;
use yaml_rust2::Yaml;

use crate::config::yaml_decode::{
    hash_get, load_yaml, validate_known_keys, yaml_array, yaml_hash, yaml_string,
};
use crate::config::{
    DedupConfig, JobConfig, MappingConfig, ReportConfig, SinkConfig, SinkOptions, SourceConfig,
    SourceOptions, StorageDefinition,
};
use crate::{ConfigError, PrepResult};

pub(crate) fn parse_config(path: &Path) -> PrepResult<JobConfig> {
    let docs = load_yaml(path)?;
    parse_docs(&docs)
}

#[cfg(test)]
pub(crate) fn parse_config_str(contents: &str) -> PrepResult<JobConfig> {
    let docs = crate::config::yaml_decode::load_yaml_str(contents)?;
    parse_docs(&docs)
}

fn parse_docs(docs: &[Yaml]) -> PrepResult<JobConfig> {
    if docs.is_empty() {
        return Err(Box::new(ConfigError("YAML is empty".to_string())));
    }
    if docs.len() > 1 {
        return Err(Box::new(ConfigError(
            "YAML contains multiple documents; expected one".to_string(),
        )));
    }
    parse_root(&docs[0])
}

fn parse_root(doc: &Yaml) -> PrepResult<JobConfig> {
    let root = yaml_hash(doc, "root")?;
    validate_known_keys(
        root,
        "root",
        &[
            "version", "storage", "source", "mapping", "sink", "dedup", "report",
        ],
    )?;
    let defaults = JobConfig::default();

    let version = get_string(root, "version", "root")?;
    let storage = match hash_get(root, "storage") {
        Some(value) => parse_storage(value)?,
        None => defaults.storage,
    };
    let source = match hash_get(root, "source") {
        Some(value) => parse_source(value)?,
        None => defaults.source,
    };
    let mapping = match hash_get(root, "mapping") {
        Some(value) => parse_mapping(value)?,
        None => defaults.mapping,
    };
    let sink = match hash_get(root, "sink") {
        Some(value) => parse_sink(value)?,
        None => defaults.sink,
    };
    let dedup = match hash_get(root, "dedup") {
        Some(value) => parse_dedup(value)?,
        None => defaults.dedup,
    };
    let report = match hash_get(root, "report") {
        Some(value) => Some(parse_report(value)?),
        None => None,
    };

    Ok(JobConfig {
        version,
        storage,
        source,
        mapping,
        sink,
        dedup,
        report,
    })
}

fn parse_storage(value: &Yaml) -> PrepResult<StorageDefinition> {
    let hash = yaml_hash(value, "storage")?;
    validate_known_keys(hash, "storage", &["type", "bucket", "region", "prefix"])?;
    Ok(StorageDefinition {
        fs_type: get_string(hash, "type", "storage")?,
        bucket: opt_string(hash, "bucket", "storage")?,
        region: opt_string(hash, "region", "storage")?,
        prefix: opt_string(hash, "prefix", "storage")?,
    })
}

fn parse_source(value: &Yaml) -> PrepResult<SourceConfig> {
    let hash = yaml_hash(value, "source")?;
    validate_known_keys(hash, "source", &["path", "options", "cast_mode"])?;
    let options = match hash_get(hash, "options") {
        Some(value) => Some(parse_source_options(value)?),
        None => None,
    };

    Ok(SourceConfig {
        path: opt_string(hash, "path", "source")?
            .unwrap_or_else(|| SourceConfig::default().path),
        options,
        cast_mode: opt_string(hash, "cast_mode", "source")?,
    })
}

fn parse_source_options(value: &Yaml) -> PrepResult<SourceOptions> {
    let hash = yaml_hash(value, "source.options")?;
    validate_known_keys(
        hash,
        "source.options",
        &["separator", "encoding", "null_values"],
    )?;
    Ok(SourceOptions {
        separator: opt_string(hash, "separator", "source.options")?,
        encoding: opt_string(hash, "encoding", "source.options")?,
        null_values: opt_vec_string(hash, "null_values", "source.options")?,
    })
}

fn parse_mapping(value: &Yaml) -> PrepResult<MappingConfig> {
    let hash = yaml_hash(value, "mapping")?;
    validate_known_keys(hash, "mapping", &["path"])?;
    Ok(MappingConfig {
        path: get_string(hash, "path", "mapping")?,
    })
}

fn parse_sink(value: &Yaml) -> PrepResult<SinkConfig> {
    let hash = yaml_hash(value, "sink")?;
    validate_known_keys(hash, "sink", &["path", "options"])?;
    let options = match hash_get(hash, "options") {
        Some(value) => Some(parse_sink_options(value)?),
        None => None,
    };
    Ok(SinkConfig {
        path: opt_string(hash, "path", "sink")?.unwrap_or_else(|| SinkConfig::default().path),
        options,
    })
}

fn parse_sink_options(value: &Yaml) -> PrepResult<SinkOptions> {
    let hash = yaml_hash(value, "sink.options")?;
    validate_known_keys(hash, "sink.options", &["compression", "row_group_size"])?;
    Ok(SinkOptions {
        compression: opt_string(hash, "compression", "sink.options")?,
        row_group_size: opt_u64(hash, "row_group_size", "sink.options")?,
    })
}

fn parse_dedup(value: &Yaml) -> PrepResult<DedupConfig> {
    let hash = yaml_hash(value, "dedup")?;
    validate_known_keys(hash, "dedup", &["key", "order_by"])?;
    let defaults = DedupConfig::default();
    Ok(DedupConfig {
        key: opt_string(hash, "key", "dedup")?.unwrap_or(defaults.key),
        order_by: opt_string(hash, "order_by", "dedup")?.unwrap_or(defaults.order_by),
    })
}

fn parse_report(value: &Yaml) -> PrepResult<ReportConfig> {
    let hash = yaml_hash(value, "report")?;
    validate_known_keys(hash, "report", &["path"])?;
    Ok(ReportConfig {
        path: get_string(hash, "path", "report")?,
    })
}

fn get_value<'a>(hash: &'a Hash, key: &str, ctx: &str) -> PrepResult<&'a Yaml> {
    hash_get(hash, key).ok_or_else(|| {
        Box::new(ConfigError(format!("missing required field {ctx}.{key}")))
            as Box<dyn std::error::Error + Send + Sync>
    })
}

fn get_string(hash: &Hash, key: &str, ctx: &str) -> PrepResult<String> {
    let value = get_value(hash, key, ctx)?;
    yaml_string(value, &format!("{ctx}.{key}"))
}

fn opt_string(hash: &Hash, key: &str, ctx: &str) -> PrepResult<Option<String>> {
    match hash_get(hash, key) {
        Some(value) => Ok(Some(yaml_string(value, &format!("{ctx}.{key}"))?)),
        None => Ok(None),
    }
}

fn opt_vec_string(hash: &Hash, key: &str, ctx: &str) -> PrepResult<Option<Vec<String>>> {
    match hash_get(hash, key) {
        Some(value) => {
            let field = format!("{ctx}.{key}");
            let array = yaml_array(value, &field)?;
            let mut values = Vec::with_capacity(array.len());
            for item in array {
                values.push(yaml_string(item, &field)?);
            }
            Ok(Some(values))
        }
        None => Ok(None),
    }
}

fn opt_u64(hash: &Hash, key: &str, ctx: &str) -> PrepResult<Option<u64>> {
    match hash_get(hash, key) {
        Some(Yaml::Integer(raw)) => u64::try_from(*raw).map(Some).map_err(|_| {
            Box::new(ConfigError(format!(
                "{ctx}.{key} must be a non-negative integer"
            ))) as Box<dyn std::error::Error + Send + Sync>
        }),
        Some(_) => Err(Box::new(ConfigError(format!(
            "expected integer at {ctx}.{key}"
        )))),
        None => Ok(None),
    }
}
