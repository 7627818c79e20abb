mod parse;
mod storage;
mod types;
mod validate;
mod yaml_decode;

use std::path::{Path, PathBuf};

pub use storage::{local_uri, resolve_local_path, ResolvedPath, StorageResolver};
pub use types::*;

pub(crate) use storage::LOCAL_SCHEME;
pub(crate) use validate::{validate_config, validate_type_name};

/// Load the job config from `path`, or fall back to the built-in defaults.
pub fn load_job_config(path: Option<&Path>) -> crate::PrepResult<JobConfig> {
    match path {
        Some(path) => parse::parse_config(path),
        None => Ok(JobConfig::default()),
    }
}

/// Directory that relative local paths of the job resolve against.
pub fn config_dir(path: Option<&Path>) -> crate::PrepResult<PathBuf> {
    match path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}
