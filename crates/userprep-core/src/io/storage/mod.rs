use std::path::{Path, PathBuf};

use crate::config::StorageDefinition;
use crate::{ConfigError, PrepResult};

pub mod local;
pub mod planner;
pub mod s3;
pub mod target;

pub use planner::{join_prefix, ObjectRef};
pub use target::Target;

/// Object access shared by the local filesystem and s3.
///
/// Every method takes a full uri (`local://...` or `s3://bucket/key`), so
/// callers never branch on the backend.
pub trait StorageClient: Send + Sync {
    /// Objects whose uri starts with `prefix_uri`, sorted by uri.
    fn list(&self, prefix_uri: &str) -> PrepResult<Vec<ObjectRef>>;
    /// Make the object available as a local file under `temp_dir`.
    fn download_to_temp(&self, uri: &str, temp_dir: &Path) -> PrepResult<PathBuf>;
    fn upload_from_path(&self, local_path: &Path, uri: &str) -> PrepResult<()>;
    /// Deleting a missing object is not an error.
    fn delete(&self, uri: &str) -> PrepResult<()>;
    /// Remove directories left empty under `prefix_uri`, keeping the prefix
    /// itself. Object stores have no directories.
    fn prune_empty_dirs(&self, _prefix_uri: &str) -> PrepResult<()> {
        Ok(())
    }
}

pub fn client_for(definition: &StorageDefinition) -> PrepResult<Box<dyn StorageClient>> {
    match definition.fs_type.as_str() {
        "local" => Ok(Box::new(local::LocalClient::new())),
        "s3" => {
            let bucket = definition.bucket.clone().ok_or_else(|| {
                Box::new(ConfigError(
                    "storage.bucket is required for type s3".to_string(),
                )) as Box<dyn std::error::Error + Send + Sync>
            })?;
            Ok(Box::new(s3::S3Client::new(
                bucket,
                definition.region.as_deref(),
            )?))
        }
        other => Err(Box::new(ConfigError(format!(
            "storage type {other} is unsupported"
        )))),
    }
}
