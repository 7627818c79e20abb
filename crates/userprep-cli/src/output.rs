use userprep_core::RunOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Default,
    Quiet,
    Verbose,
}

pub fn format_run_output(outcome: &RunOutcome, mode: OutputMode) -> String {
    let report = &outcome.report;
    let mut lines = Vec::new();

    if mode != OutputMode::Quiet {
        lines.push(format!("run id: {}", &outcome.run_id));
        lines.push(format!("input: {}", &report.inputs.source));
        lines.push(format!(
            "mapping: {} ({} columns)",
            &report.inputs.mapping,
            report.mapping.len()
        ));
        lines.push(format!(
            "output: {} ({})",
            &report.output.path,
            report.output.part_files.join(", ")
        ));
    }

    if mode == OutputMode::Verbose {
        lines.push(format!("  cast_mode: {}", &report.inputs.cast_mode));
        lines.push(format!(
            "  dedup: key={} order_by={}",
            &report.dedup.key, &report.dedup.order_by
        ));
        lines.push("  columns:".to_string());
        for column in &report.mapping {
            lines.push(format!("    {}: {}", column.column, column.type_name));
        }
        for mismatch in &report.cast_nulls {
            lines.push(format!(
                "  cast nulls: {} ({}) count={}",
                mismatch.column, mismatch.type_name, mismatch.count
            ));
        }
        if report.output.stale_removed > 0 {
            lines.push(format!(
                "  stale objects removed: {}",
                report.output.stale_removed
            ));
        }
    }

    lines.push(format!(
        "Totals: rows_read={} rows_written={} duplicates_dropped={} cast_nulls={}",
        report.results.rows_read,
        report.results.rows_written,
        report.results.duplicates_dropped,
        report.results.cast_nulls_total
    ));
    lines.push(format!(
        "Overall: {} (elapsed_ms={})",
        report.run.status.as_str(),
        report.run.duration_ms
    ));
    if mode != OutputMode::Quiet {
        lines.push(format!(
            "Run report: {}",
            outcome.report_uri.as_deref().unwrap_or("(disabled)")
        ));
    }

    lines.join("\n")
}
