use std::fs;
use std::path::Path;

use userprep_core::{run, RunOptions};

fn write_job(root: &Path, report_yaml: &str) -> std::path::PathBuf {
    fs::create_dir_all(root.join("data/input/users")).expect("input dir");
    fs::create_dir_all(root.join("config")).expect("config dir");
    fs::write(
        root.join("data/input/users/load.csv"),
        "id,name,email,phone,address,update_date,age\n\
         1,a@x.com,Alice,111,Rua A,2024-01-01T00:00:00,x\n\
         1,b@x.com,Bob,222,Rua B,2024-02-01T00:00:00,31\n",
    )
    .expect("write csv");
    fs::write(
        root.join("config/types_mapping.json"),
        r#"{"update_date": "timestamp", "age": "integer"}"#,
    )
    .expect("write mapping");
    let config = root.join("job.yml");
    fs::write(
        &config,
        format!("version: \"0.1\"\nstorage:\n  type: local\n{report_yaml}"),
    )
    .expect("write config");
    config
}

#[test]
fn run_report_is_written_under_run_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), "report:\n  path: reports\n");

    let outcome = run(RunOptions {
        config: Some(config),
        run_id: Some("report-run".to_string()),
    })
    .expect("run");

    let report_path = dir.path().join("reports/run_report-run/run.json");
    assert!(report_path.is_file());
    assert_eq!(
        outcome.report_uri.as_deref(),
        Some(format!("local://{}", report_path.display()).as_str())
    );

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("read report"))
            .expect("report json");
    assert_eq!(value["run"]["run_id"], "report-run");
    assert_eq!(value["run"]["status"], "success_with_warnings");
    assert_eq!(value["results"]["rows_read"], 2);
    assert_eq!(value["results"]["rows_written"], 1);
    assert_eq!(value["cast_nulls"][0]["column"], "age");
    assert_eq!(value["inputs"]["cast_mode"], "coerce");
    let mapped = value["mapping"]
        .as_array()
        .expect("mapping array")
        .iter()
        .map(|entry| entry["column"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        mapped,
        vec!["update_date", "age", "id", "email", "name", "phone", "address"]
    );
}

#[test]
fn report_is_skipped_without_report_section() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), "");

    let outcome = run(RunOptions {
        config: Some(config),
        run_id: None,
    })
    .expect("run");

    assert!(outcome.report_uri.is_none());
    assert!(!dir.path().join("reports").exists());
    assert!(!outcome.run_id.contains(':'));
}
