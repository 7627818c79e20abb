use crate::mapping::TypeMapping;
use crate::report::output::write_run_report;
use crate::{report, PrepResult, RunOptions, ValidateOptions};

mod context;
pub(crate) mod dedup;
pub(crate) mod load;
mod output;
mod temporal;

use context::RunContext;
use load::LoadedTable;
use output::WrittenOutput;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub mapping: TypeMapping,
    pub report: report::RunReport,
    pub report_uri: Option<String>,
}

/// Load, deduplicate and write once.
pub fn run(options: RunOptions) -> PrepResult<RunOutcome> {
    let job = crate::validate(ValidateOptions {
        config: options.config.clone(),
    })?;
    let context = RunContext::new(job, &options)?;
    log::info!(
        "run {} started: {} -> {}",
        context.run_id,
        context.input.uri,
        context.output.target_uri()
    );

    let loaded = load::load_typed_table(&context)?;
    let dedup_config = &context.config.dedup;
    let mut deduped =
        dedup::deduplicate_latest(&loaded.df, &dedup_config.key, &dedup_config.order_by)?;
    log::info!(
        "kept {} of {} rows after deduplicating on {}",
        deduped.height(),
        loaded.rows_read,
        dedup_config.key
    );

    let written = output::write_output(
        &mut deduped,
        &context.output,
        context.client.as_ref(),
        context.scratch_dir(),
        context.config.sink.options.as_ref(),
    )?;

    let report = build_run_report(&context, &loaded, deduped.height() as u64, &written);
    let report_uri = match &context.report_target {
        Some(target) => Some(write_run_report(
            target,
            &report,
            context.client.as_ref(),
            context.scratch_dir(),
        )?),
        None => None,
    };

    Ok(RunOutcome {
        run_id: context.run_id.clone(),
        mapping: loaded.mapping,
        report,
        report_uri,
    })
}

fn build_run_report(
    context: &RunContext,
    loaded: &LoadedTable,
    rows_written: u64,
    written: &WrittenOutput,
) -> report::RunReport {
    let results = report::ResultsTotals {
        rows_read: loaded.rows_read,
        rows_written,
        duplicates_dropped: loaded.rows_read.saturating_sub(rows_written),
        cast_nulls_total: loaded.cast_nulls.iter().map(|mismatch| mismatch.count).sum(),
    };
    report::RunReport {
        report_version: report::REPORT_VERSION.to_string(),
        tool: report::ToolInfo::default(),
        run: report::RunInfo {
            run_id: context.run_id.clone(),
            started_at: context.started_at.clone(),
            finished_at: report::now_rfc3339(),
            duration_ms: context.run_timer.elapsed().as_millis() as u64,
            status: report::RunStatus::from_cast_nulls(&loaded.cast_nulls),
        },
        inputs: report::InputsEcho {
            source: context.input.uri.clone(),
            mapping: context.mapping.uri.clone(),
            cast_mode: context.cast_mode.as_str().to_string(),
        },
        dedup: report::DedupEcho {
            key: context.config.dedup.key.clone(),
            order_by: context.config.dedup.order_by.clone(),
        },
        mapping: loaded.mapping.entries().to_vec(),
        output: report::OutputSummary {
            path: context.output.target_uri().to_string(),
            parts_written: written.part_files.len() as u64,
            part_files: written.part_files.clone(),
            stale_removed: written.stale_removed,
        },
        results,
        cast_nulls: loaded.cast_nulls.clone(),
    }
}
