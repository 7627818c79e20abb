use std::path::{Path, PathBuf};

use crate::config::{local_uri, LOCAL_SCHEME};
use crate::errors::StorageError;
use crate::PrepResult;

use super::planner::{ensure_parent_dir, stable_sort_refs, ObjectRef};
use super::StorageClient;

pub struct LocalClient;

impl LocalClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn local_path_from_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(LOCAL_SCHEME).unwrap_or(uri))
}

impl StorageClient for LocalClient {
    fn list(&self, prefix_uri: &str) -> PrepResult<Vec<ObjectRef>> {
        let root = local_path_from_uri(prefix_uri);
        if root.is_file() {
            return Ok(vec![object_ref(&root, &root)]);
        }
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut refs = Vec::new();
        collect_files(&root, &root, &mut refs)?;
        Ok(stable_sort_refs(refs))
    }

    fn download_to_temp(&self, uri: &str, _temp_dir: &Path) -> PrepResult<PathBuf> {
        let path = local_path_from_uri(uri);
        if !path.is_file() {
            return Err(Box::new(StorageError(format!(
                "local object not found: {}",
                path.display()
            ))));
        }
        Ok(path)
    }

    fn upload_from_path(&self, local_path: &Path, uri: &str) -> PrepResult<()> {
        let dest = local_path_from_uri(uri);
        ensure_parent_dir(&dest)?;
        std::fs::copy(local_path, &dest).map_err(|err| {
            Box::new(StorageError(format!(
                "local upload failed to {}: {err}",
                dest.display()
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;
        Ok(())
    }

    fn delete(&self, uri: &str) -> PrepResult<()> {
        let path = local_path_from_uri(uri);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Box::new(StorageError(format!(
                "local delete failed for {}: {err}",
                path.display()
            )))),
        }
    }

    fn prune_empty_dirs(&self, prefix_uri: &str) -> PrepResult<()> {
        let root = local_path_from_uri(prefix_uri);
        if root.is_dir() {
            remove_empty_children(&root)?;
        }
        Ok(())
    }
}

fn collect_files(root: &Path, dir: &Path, refs: &mut Vec<ObjectRef>) -> PrepResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, refs)?;
        } else if path.is_file() {
            refs.push(object_ref(root, &path));
        }
    }
    Ok(())
}

fn object_ref(root: &Path, path: &Path) -> ObjectRef {
    let key = path
        .strip_prefix(root)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string();
    ObjectRef {
        uri: local_uri(path),
        key,
    }
}

/// Remove empty directories below `dir`. Returns whether `dir` is empty.
fn remove_empty_children(dir: &Path) -> PrepResult<bool> {
    let mut empty = true;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && remove_empty_children(&path)? {
            std::fs::remove_dir(&path).map_err(|err| {
                Box::new(StorageError(format!(
                    "local cleanup failed for {}: {err}",
                    path.display()
                ))) as Box<dyn std::error::Error + Send + Sync>
            })?;
        } else {
            empty = false;
        }
    }
    Ok(empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_walks_nested_directories() -> PrepResult<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("output.parquet");
        std::fs::create_dir_all(out.join("nested"))?;
        std::fs::write(out.join("_SUCCESS"), b"")?;
        std::fs::write(out.join("nested/part-00000.parquet"), b"data")?;

        let refs = LocalClient::new().list(&local_uri(&out))?;
        let keys = refs.iter().map(|obj| obj.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["_SUCCESS", "nested/part-00000.parquet"]);
        Ok(())
    }

    #[test]
    fn list_missing_prefix_is_empty() -> PrepResult<()> {
        let dir = tempfile::tempdir()?;
        let refs = LocalClient::new().list(&local_uri(&dir.path().join("absent")))?;
        assert!(refs.is_empty());
        Ok(())
    }

    #[test]
    fn upload_creates_parents_and_delete_is_idempotent() -> PrepResult<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("source.bin");
        std::fs::write(&source, b"payload")?;
        let uri = local_uri(&dir.path().join("a/b/target.bin"));

        let client = LocalClient::new();
        client.upload_from_path(&source, &uri)?;
        assert_eq!(std::fs::read(local_path_from_uri(&uri))?, b"payload");

        client.delete(&uri)?;
        client.delete(&uri)?;
        assert!(!local_path_from_uri(&uri).exists());
        Ok(())
    }

    #[test]
    fn prune_removes_empty_directories_below_the_prefix() -> PrepResult<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("output.parquet");
        std::fs::create_dir_all(out.join("nested/deeper"))?;
        std::fs::create_dir_all(out.join("kept"))?;
        std::fs::write(out.join("kept/part-00000.parquet"), b"data")?;

        LocalClient::new().prune_empty_dirs(&format!("{}/", local_uri(&out)))?;
        assert!(!out.join("nested").exists());
        assert!(out.join("kept/part-00000.parquet").is_file());
        assert!(out.is_dir());
        Ok(())
    }

    #[test]
    fn download_of_missing_file_fails() {
        let client = LocalClient::new();
        let err = client
            .download_to_temp("local:///definitely/not/here.csv", Path::new("/tmp"))
            .expect_err("missing");
        assert!(err.to_string().contains("not found"));
    }
}
