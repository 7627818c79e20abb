use std::path::PathBuf;

pub mod checks;
pub mod config;
pub mod errors;
pub mod io;
pub mod mapping;
pub mod report;
mod run;
pub mod warnings;

pub use run::dedup::deduplicate_latest;
pub use run::load::{project_and_cast, swapped_column_names};
pub use run::{run, RunOutcome};

pub type PrepResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Default)]
pub struct ValidateOptions {
    pub config: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub run_id: Option<String>,
}

/// Parse and validate the job config without touching storage.
///
/// Without a config path the built-in locations are validated, which mirrors
/// what a bare `run` would execute.
pub fn validate(options: ValidateOptions) -> PrepResult<config::JobConfig> {
    let job = config::load_job_config(options.config.as_deref())?;
    config::validate_config(&job)?;
    Ok(job)
}
