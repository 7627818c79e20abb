use std::path::Path;

use polars::prelude::DataFrame;

use crate::io::storage::{StorageClient, Target};
use crate::io::write::parquet::write_parquet_file;
use crate::{config, warnings, PrepResult};

pub(crate) const PART_FILE_NAME: &str = "part-00000.parquet";
pub(crate) const SUCCESS_MARKER: &str = "_SUCCESS";

pub(crate) struct WrittenOutput {
    pub part_files: Vec<String>,
    pub stale_removed: u64,
}

/// Replace everything under `target` with a single parquet part file.
///
/// The part is encoded locally first, so an encoding failure leaves the
/// destination untouched. A single object sitting at the target path itself
/// is removed before the upload. Objects that were under the prefix are
/// removed after it, then the `_SUCCESS` marker is written.
pub(crate) fn write_output(
    df: &mut DataFrame,
    target: &Target,
    client: &dyn StorageClient,
    scratch_dir: &Path,
    options: Option<&config::SinkOptions>,
) -> PrepResult<WrittenOutput> {
    let local_part = scratch_dir.join(PART_FILE_NAME);
    write_parquet_file(df, &local_part, options)?;

    let mut stale_removed = 0;
    let target_uri = target.target_uri();
    let bare_object = client
        .list(target_uri)?
        .into_iter()
        .any(|object| object.uri == target_uri);
    if bare_object {
        warnings::emit(&format!(
            "output path {target_uri} holds a single object; replacing it with a directory"
        ));
        client.delete(target_uri)?;
        stale_removed += 1;
    }
    let existing = client.list(&target.listing_prefix())?;

    let part_uri = target.join_relative(PART_FILE_NAME);
    client.upload_from_path(&local_part, &part_uri)?;
    log::debug!("uploaded {part_uri}");

    let success_uri = target.join_relative(SUCCESS_MARKER);
    for object in existing.iter().filter(|object| object.uri != part_uri) {
        client.delete(&object.uri)?;
        if object.uri != success_uri {
            warnings::emit(&format!("removed stale output object {}", object.uri));
            stale_removed += 1;
        }
    }

    client.prune_empty_dirs(&target.listing_prefix())?;

    let local_marker = scratch_dir.join(SUCCESS_MARKER);
    std::fs::write(&local_marker, b"")?;
    client.upload_from_path(&local_marker, &success_uri)?;

    log::info!(
        "wrote {} rows to {target_uri}",
        df.height()
    );
    Ok(WrittenOutput {
        part_files: vec![PART_FILE_NAME.to_string()],
        stale_removed,
    })
}
