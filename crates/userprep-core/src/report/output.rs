use std::io::Write;
use std::path::{Path, PathBuf};

use crate::io::storage::{planner::ensure_parent_dir, StorageClient, Target};
use crate::report::{ReportWriter, RunReport};
use crate::PrepResult;

/// Write the run report under `target` and return its uri.
///
/// Local targets get a temp-file-then-rename write; s3 targets upload a
/// staged copy from `scratch_dir`.
pub fn write_run_report(
    target: &Target,
    report: &RunReport,
    client: &dyn StorageClient,
    scratch_dir: &Path,
) -> PrepResult<String> {
    let relative = ReportWriter::report_relative_path(&report.run.run_id);
    let content = ReportWriter::to_json(report)?;
    let uri = target.join_relative(&relative);

    match target {
        Target::Local { base_path, .. } => {
            let output_path = Path::new(base_path).join(&relative);
            write_text_file(&output_path, &content)?;
        }
        Target::S3 { .. } => {
            let staged = scratch_dir.join(ReportWriter::report_file_name());
            write_text_file(&staged, &content)?;
            client.upload_from_path(&staged, &uri)?;
        }
    }
    log::debug!("run report written to {uri}");
    Ok(uri)
}

fn write_text_file(path: &Path, content: &str) -> PrepResult<()> {
    ensure_parent_dir(path)?;
    let tmp_path = temp_path(path);
    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("run.json");
    path.with_file_name(format!("{file_name}.tmp-{}", std::process::id()))
}
