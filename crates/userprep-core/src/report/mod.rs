pub mod output;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::checks::CastMismatch;
use crate::mapping::MappedColumn;

pub const REPORT_VERSION: &str = "0.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunReport {
    pub report_version: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub inputs: InputsEcho,
    pub dedup: DedupEcho,
    pub mapping: Vec<MappedColumn>,
    pub output: OutputSummary,
    pub results: ResultsTotals,
    pub cast_nulls: Vec<CastMismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: "userprep".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InputsEcho {
    pub source: String,
    pub mapping: String,
    pub cast_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DedupEcho {
    pub key: String,
    pub order_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputSummary {
    pub path: String,
    pub parts_written: u64,
    pub part_files: Vec<String>,
    pub stale_removed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResultsTotals {
    pub rows_read: u64,
    pub rows_written: u64,
    pub duplicates_dropped: u64,
    pub cast_nulls_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    SuccessWithWarnings,
}

impl RunStatus {
    pub fn from_cast_nulls(cast_nulls: &[CastMismatch]) -> Self {
        if cast_nulls.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::SuccessWithWarnings
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::SuccessWithWarnings => "success_with_warnings",
        }
    }
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "report io error: {err}"),
            ReportError::Serialize(err) => write!(f, "report serialize error: {err}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Run ids double as directory names, so the colons of the timestamp go.
pub fn run_id_from_timestamp(timestamp: &str) -> String {
    timestamp.replace(':', "-")
}

pub struct ReportWriter;

impl ReportWriter {
    pub fn run_dir_name(run_id: &str) -> String {
        format!("run_{run_id}")
    }

    pub fn report_file_name() -> String {
        "run.json".to_string()
    }

    pub fn report_relative_path(run_id: &str) -> String {
        format!("{}/{}", Self::run_dir_name(run_id), Self::report_file_name())
    }

    pub fn to_json(report: &RunReport) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
