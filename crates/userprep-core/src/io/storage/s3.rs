use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;

use crate::errors::StorageError;
use crate::{ConfigError, PrepResult};

use super::planner::{stable_sort_refs, ObjectRef};
use super::StorageClient;

/// Blocking s3 client bound to one bucket.
///
/// The sdk is async; each call is driven to completion on a private
/// current-thread runtime so the rest of the job stays synchronous.
pub struct S3Client {
    bucket: String,
    client: Client,
    runtime: Runtime,
}

impl S3Client {
    pub fn new(bucket: String, region: Option<&str>) -> PrepResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Box::new(ConfigError(format!("failed to build aws runtime: {err}"))))?;
        let config = runtime.block_on(async {
            let region_provider = match region {
                Some(region) => RegionProviderChain::first_try(Region::new(region.to_string()))
                    .or_default_provider(),
                None => RegionProviderChain::default_provider(),
            };
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(region_provider)
                .load()
                .await
        });
        let client = Client::new(&config);
        Ok(Self {
            bucket,
            client,
            runtime,
        })
    }

    fn key_in_bucket(&self, uri: &str) -> PrepResult<String> {
        let location = parse_s3_uri(uri)?;
        if location.bucket != self.bucket {
            return Err(Box::new(StorageError(format!(
                "{uri} is outside bucket {}",
                self.bucket
            ))));
        }
        Ok(location.key)
    }
}

impl StorageClient for S3Client {
    fn list(&self, prefix_uri: &str) -> PrepResult<Vec<ObjectRef>> {
        let prefix = self.key_in_bucket(prefix_uri)?;
        let bucket = self.bucket.clone();
        let refs = self.runtime.block_on(async {
            let mut refs = Vec::new();
            let mut continuation = None;
            loop {
                let mut request = self.client.list_objects_v2().bucket(&bucket);
                if !prefix.is_empty() {
                    request = request.prefix(&prefix);
                }
                if let Some(token) = continuation {
                    request = request.continuation_token(token);
                }
                let response = request.send().await.map_err(|err| {
                    Box::new(StorageError(format!(
                        "s3 list objects failed for {prefix_uri}: {err}"
                    ))) as Box<dyn std::error::Error + Send + Sync>
                })?;
                for object in response.contents() {
                    if let Some(key) = object.key() {
                        refs.push(ObjectRef {
                            uri: format_s3_uri(&bucket, key),
                            key: key.to_string(),
                        });
                    }
                }
                if response.is_truncated().unwrap_or(false) {
                    continuation = response.next_continuation_token().map(str::to_string);
                    if continuation.is_none() {
                        break;
                    }
                } else {
                    break;
                }
            }
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(refs)
        })?;
        Ok(stable_sort_refs(refs))
    }

    fn download_to_temp(&self, uri: &str, temp_dir: &Path) -> PrepResult<PathBuf> {
        let key = self.key_in_bucket(uri)?;
        let dest = temp_path_for_key(temp_dir, &key);
        let bucket = self.bucket.clone();
        let target = dest.clone();
        self.runtime.block_on(async move {
            let response = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| {
                    Box::new(StorageError(format!("s3 get object failed for {uri}: {err}")))
                        as Box<dyn std::error::Error + Send + Sync>
                })?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::File::create(&target).await?;
            let mut reader = response.body.into_async_read();
            tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
        })?;
        Ok(dest)
    }

    fn upload_from_path(&self, local_path: &Path, uri: &str) -> PrepResult<()> {
        let key = self.key_in_bucket(uri)?;
        let bucket = self.bucket.clone();
        let path = local_path.to_path_buf();
        self.runtime.block_on(async move {
            let body = ByteStream::from_path(path).await.map_err(|err| {
                Box::new(StorageError(format!("s3 upload body failed: {err}")))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|err| {
                    Box::new(StorageError(format!("s3 put object failed for {uri}: {err}")))
                        as Box<dyn std::error::Error + Send + Sync>
                })?;
            Ok(())
        })
    }

    fn delete(&self, uri: &str) -> PrepResult<()> {
        let key = self.key_in_bucket(uri)?;
        let bucket = self.bucket.clone();
        self.runtime.block_on(async move {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| {
                    Box::new(StorageError(format!(
                        "s3 delete object failed for {uri}: {err}"
                    ))) as Box<dyn std::error::Error + Send + Sync>
                })?;
            Ok(())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

pub fn parse_s3_uri(uri: &str) -> PrepResult<S3Location> {
    let stripped = uri.strip_prefix("s3://").ok_or_else(|| {
        Box::new(ConfigError(format!("expected s3 uri, got {uri}")))
            as Box<dyn std::error::Error + Send + Sync>
    })?;
    let (bucket, key) = stripped.split_once('/').unwrap_or((stripped, ""));
    if bucket.is_empty() {
        return Err(Box::new(ConfigError(format!(
            "missing bucket in s3 uri: {uri}"
        ))));
    }
    Ok(S3Location {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

pub fn format_s3_uri(bucket: &str, key: &str) -> String {
    if key.is_empty() {
        format!("s3://{bucket}")
    } else {
        format!("s3://{bucket}/{key}")
    }
}

/// Collision-free local name for a downloaded key.
pub fn temp_path_for_key(temp_dir: &Path, key: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    let name = Path::new(key)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "object".to_string());
    temp_dir.join(format!("{hash:016x}_{}", sanitize_filename(&name)))
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
