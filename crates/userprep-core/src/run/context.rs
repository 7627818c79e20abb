use std::path::Path;
use std::time::Instant;

use tempfile::TempDir;

use crate::io::storage::{self, StorageClient, Target};
use crate::{config, report, PrepResult, RunOptions};

/// Everything a stage needs, resolved once per run.
pub struct RunContext {
    pub config: config::JobConfig,
    pub input: config::ResolvedPath,
    pub mapping: config::ResolvedPath,
    pub output: Target,
    pub report_target: Option<Target>,
    pub client: Box<dyn StorageClient>,
    pub cast_mode: config::CastMode,
    pub scratch: TempDir,
    pub run_id: String,
    pub started_at: String,
    pub run_timer: Instant,
}

impl RunContext {
    pub fn new(config: config::JobConfig, options: &RunOptions) -> PrepResult<Self> {
        let config_dir = config::config_dir(options.config.as_deref())?;
        let storage_resolver = config::StorageResolver::new(&config, &config_dir);
        let input = storage_resolver.resolve_path("source.path", &config.source.path)?;
        let mapping = storage_resolver.resolve_path("mapping.path", &config.mapping.path)?;
        let output = Target::from_resolved(
            &storage_resolver.resolve_path("sink.path", &config.sink.path)?,
        )?;
        let report_target = match config.report.as_ref() {
            Some(report) => Some(Target::from_resolved(
                &storage_resolver.resolve_path("report.path", &report.path)?,
            )?),
            None => None,
        };
        let client = storage::client_for(storage_resolver.definition())?;
        let cast_mode = config.source.cast_mode()?;
        let scratch = tempfile::Builder::new().prefix("userprep-").tempdir()?;

        let started_at = report::now_rfc3339();
        let run_id = options
            .run_id
            .clone()
            .unwrap_or_else(|| report::run_id_from_timestamp(&started_at));

        Ok(Self {
            config,
            input,
            mapping,
            output,
            report_target,
            client,
            cast_mode,
            scratch,
            run_id,
            started_at,
            run_timer: Instant::now(),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn source_options(&self) -> config::SourceOptions {
        self.config.source.options.clone().unwrap_or_default()
    }
}
