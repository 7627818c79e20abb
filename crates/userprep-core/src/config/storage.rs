use std::path::{Path, PathBuf};

use crate::config::{JobConfig, StorageDefinition};
use crate::io::storage::s3::{format_s3_uri, parse_s3_uri};
use crate::{ConfigError, PrepResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub storage: String,
    pub uri: String,
    pub local_path: Option<PathBuf>,
}

/// Turns the raw paths of a job config into storage uris.
///
/// Local paths resolve against the directory holding the config file (or the
/// working directory when running on built-in defaults); s3 paths are keys
/// under the configured bucket and optional prefix.
pub struct StorageResolver {
    config_dir: PathBuf,
    definition: StorageDefinition,
}

impl StorageResolver {
    pub fn new(config: &JobConfig, config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            definition: config.storage.clone(),
        }
    }

    pub fn definition(&self) -> &StorageDefinition {
        &self.definition
    }

    pub fn resolve_path(&self, field: &str, raw_path: &str) -> PrepResult<ResolvedPath> {
        let definition = &self.definition;
        match definition.fs_type.as_str() {
            "local" => {
                if is_remote_uri(raw_path) {
                    return Err(Box::new(ConfigError(format!(
                        "{field} must be a local path (got {raw_path})"
                    ))));
                }
                let resolved = resolve_local_path(&self.config_dir, raw_path);
                Ok(ResolvedPath {
                    storage: definition.fs_type.clone(),
                    uri: local_uri(&resolved),
                    local_path: Some(resolved),
                })
            }
            "s3" => {
                let uri = resolve_s3_uri(definition, field, raw_path)?;
                Ok(ResolvedPath {
                    storage: definition.fs_type.clone(),
                    uri,
                    local_path: None,
                })
            }
            other => Err(Box::new(ConfigError(format!(
                "storage type {other} is unsupported"
            )))),
        }
    }
}

pub fn resolve_local_path(config_dir: &Path, raw_path: &str) -> PathBuf {
    let raw_path = raw_path.strip_prefix(LOCAL_SCHEME).unwrap_or(raw_path);
    let path = Path::new(raw_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

pub(crate) const LOCAL_SCHEME: &str = "local://";

pub fn local_uri(path: &Path) -> String {
    format!("{LOCAL_SCHEME}{}", path.display())
}

fn resolve_s3_uri(
    definition: &StorageDefinition,
    field: &str,
    raw_path: &str,
) -> PrepResult<String> {
    let bucket = definition.bucket.as_ref().ok_or_else(|| {
        Box::new(ConfigError(
            "storage.bucket is required for type s3".to_string(),
        ))
    })?;
    if raw_path.starts_with("s3://") {
        let location = parse_s3_uri(raw_path)?;
        if location.bucket != *bucket {
            return Err(Box::new(ConfigError(format!(
                "{field} bucket mismatch: {} (storage bucket is {bucket})",
                location.bucket
            ))));
        }
        return Ok(format_s3_uri(bucket, &location.key));
    }
    if is_remote_uri(raw_path) {
        return Err(Box::new(ConfigError(format!(
            "{field} must be an s3 key or s3 uri (got {raw_path})"
        ))));
    }

    let key = join_s3_key(definition.prefix.as_deref().unwrap_or(""), raw_path);
    Ok(format_s3_uri(bucket, &key))
}

fn join_s3_key(prefix: &str, raw_path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let trimmed = raw_path.trim_start_matches('/');
    match (prefix.is_empty(), trimmed.is_empty()) {
        (true, true) => String::new(),
        (true, false) => trimmed.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, trimmed),
    }
}

fn is_remote_uri(value: &str) -> bool {
    value.contains("://") && !value.starts_with(LOCAL_SCHEME)
}
