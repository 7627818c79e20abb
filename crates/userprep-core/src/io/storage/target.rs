use crate::io::storage::planner::join_prefix;
use crate::{config, io, PrepResult};

/// A resolved output location: a local directory or an s3 prefix.
#[derive(Debug, Clone)]
pub enum Target {
    Local {
        uri: String,
        base_path: String,
    },
    S3 {
        uri: String,
        bucket: String,
        base_key: String,
    },
}

impl Target {
    pub fn from_resolved(resolved: &config::ResolvedPath) -> PrepResult<Self> {
        if let Some(path) = &resolved.local_path {
            return Ok(Target::Local {
                uri: resolved.uri.clone(),
                base_path: path.display().to_string(),
            });
        }
        let location = io::storage::s3::parse_s3_uri(&resolved.uri)?;
        Ok(Target::S3 {
            uri: resolved.uri.clone(),
            bucket: location.bucket,
            base_key: location.key,
        })
    }

    pub fn target_uri(&self) -> &str {
        match self {
            Target::Local { uri, .. } | Target::S3 { uri, .. } => uri.as_str(),
        }
    }

    /// Uri of `relative` inside this target.
    pub fn join_relative(&self, relative: &str) -> String {
        match self {
            Target::Local { base_path, .. } => {
                config::local_uri(std::path::Path::new(&join_prefix(base_path, relative)))
            }
            Target::S3 {
                bucket, base_key, ..
            } => io::storage::s3::format_s3_uri(bucket, &join_prefix(base_key, relative)),
        }
    }

    /// Prefix to list when looking for objects under this target.
    pub fn listing_prefix(&self) -> String {
        io::storage::planner::as_directory_prefix(self.target_uri())
    }
}
