use std::path::Path;

use crate::PrepResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub uri: String,
    pub key: String,
}

pub fn join_prefix(prefix: &str, name: &str) -> String {
    let left = prefix.trim_end_matches('/');
    let right = name.trim_start_matches('/');
    if left.is_empty() {
        right.to_string()
    } else if right.is_empty() {
        left.to_string()
    } else {
        format!("{left}/{right}")
    }
}

/// Directory form of a prefix, so `out/users` never matches `out/users_old`.
pub fn as_directory_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

pub fn stable_sort_refs(mut refs: Vec<ObjectRef>) -> Vec<ObjectRef> {
    refs.sort_by(|a, b| a.uri.cmp(&b.uri));
    refs
}

pub fn ensure_parent_dir(path: &Path) -> PrepResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
