use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{DataFrame, DataType, ParquetReader, SerReader, TimeUnit};
use userprep_core::{run, RunOptions};

const USERS_CSV: &str = "\
id,name,email,phone,address,update_date,age
1,a@x.com,Alice,111,Rua A,2024-01-01T00:00:00,30
1,b@x.com,Bob,222,Rua B,2024-02-01T00:00:00,31
2,c@x.com,Carol,333,Rua C,2024-01-15T00:00:00,40
";

fn write_job(root: &Path, csv: &str, mapping: &str, extra_yaml: &str) -> PathBuf {
    fs::create_dir_all(root.join("data/input/users")).expect("input dir");
    fs::create_dir_all(root.join("config")).expect("config dir");
    fs::write(root.join("data/input/users/load.csv"), csv).expect("write csv");
    fs::write(root.join("config/types_mapping.json"), mapping).expect("write mapping");
    let config = root.join("job.yml");
    fs::write(
        &config,
        format!("version: \"0.1\"\nstorage:\n  type: local\n{extra_yaml}"),
    )
    .expect("write config");
    config
}

fn run_job(config: &Path) -> userprep_core::PrepResult<userprep_core::RunOutcome> {
    run(RunOptions {
        config: Some(config.to_path_buf()),
        run_id: Some("test-run".to_string()),
    })
}

fn output_dir(root: &Path) -> PathBuf {
    root.join("data/output/output.parquet")
}

fn read_output(root: &Path) -> DataFrame {
    let file = fs::File::open(output_dir(root).join("part-00000.parquet")).expect("open parquet");
    ParquetReader::new(file).finish().expect("read parquet")
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn date_only_update_dates_pick_the_latest_row() {
    let dir = tempfile::tempdir().expect("temp dir");
    let csv = "\
id,update_date,name,email,phone,address
1,2024-01-01,a@x.com,Alice,111,Rua A
1,2024-02-01,b@x.com,Bob,222,Rua B
";
    let config = write_job(dir.path(), csv, r#"{"update_date": "timestamp"}"#, "");

    let outcome = run_job(&config).expect("run");
    assert!(outcome.report.cast_nulls.is_empty());

    let df = read_output(dir.path());
    assert_eq!(df.height(), 1);
    let update_date = df.column("update_date").expect("update_date");
    assert_eq!(update_date.null_count(), 0);
    let ticks = update_date
        .as_materialized_series()
        .to_physical_repr()
        .into_owned();
    // 2024-02-01T00:00:00 in microseconds since the epoch
    assert_eq!(ticks.i64().expect("i64").get(0), Some(1_706_745_600_000_000));
    let emails = df.column("email").expect("email").str().expect("str");
    let names = df.column("name").expect("name").str().expect("str");
    assert_eq!(emails.get(0), Some("b@x.com"));
    assert_eq!(names.get(0), Some("Bob"));
}

#[test]
fn keeps_latest_row_per_id_with_swapped_identity_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(
        dir.path(),
        USERS_CSV,
        r#"{"update_date": "timestamp"}"#,
        "",
    );

    let outcome = run_job(&config).expect("run");
    assert_eq!(outcome.report.results.rows_read, 3);
    assert_eq!(outcome.report.results.rows_written, 2);
    assert_eq!(outcome.report.results.duplicates_dropped, 1);

    let df = read_output(dir.path());
    assert_eq!(df.height(), 2);
    let ids = df.column("id").expect("id").i32().expect("i32");
    assert_eq!(ids.get(0), Some(1));
    assert_eq!(ids.get(1), Some(2));
    let emails = df.column("email").expect("email").str().expect("str");
    let names = df.column("name").expect("name").str().expect("str");
    assert_eq!(emails.get(0), Some("b@x.com"));
    assert_eq!(names.get(0), Some("Bob"));
    assert_eq!(
        df.column("update_date").expect("update_date").dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, None)
    );
    assert!(output_dir(dir.path()).join("_SUCCESS").is_file());
}

#[test]
fn output_columns_follow_augmented_mapping_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(
        dir.path(),
        USERS_CSV,
        r#"{"update_date": "timestamp", "phone": "integer", "id": "string", "age": "long"}"#,
        "",
    );

    let outcome = run_job(&config).expect("run");
    let df = read_output(dir.path());
    assert_eq!(
        column_names(&df),
        vec!["update_date", "phone", "id", "age", "email", "name", "address"]
    );
    assert_eq!(df.column("id").expect("id").dtype(), &DataType::Int32);
    assert_eq!(df.column("phone").expect("phone").dtype(), &DataType::String);
    assert_eq!(df.column("age").expect("age").dtype(), &DataType::Int64);
    assert_eq!(outcome.mapping.get("phone"), Some("string"));
    assert_eq!(outcome.mapping.get("id"), Some("integer"));
}

#[test]
fn missing_order_column_fails_before_writing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), USERS_CSV, r#"{"age": "integer"}"#, "");

    let err = run_job(&config).expect_err("update_date is not mapped");
    assert!(err.to_string().contains("column update_date not found"));
    assert!(!output_dir(dir.path()).exists());
}

#[test]
fn mapped_column_absent_from_input_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(
        dir.path(),
        USERS_CSV,
        r#"{"update_date": "timestamp", "city": "string"}"#,
        "",
    );

    let err = run_job(&config).expect_err("city is not in the csv");
    assert!(err.to_string().contains("mapped columns not found in input: city"));
    assert!(!output_dir(dir.path()).exists());
}

#[test]
fn input_without_email_column_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(
        dir.path(),
        "id,name,update_date\n1,a@x.com,2024-01-01T00:00:00\n",
        r#"{"update_date": "timestamp"}"#,
        "",
    );

    let err = run_job(&config).expect_err("no email column");
    assert!(err.to_string().contains("column email not found in input"));
}

#[test]
fn malformed_mapping_document_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), USERS_CSV, r#"{"update_date": }"#, "");

    let err = run_job(&config).expect_err("bad json");
    assert!(err.to_string().contains("not valid json"));
}

#[test]
fn coerce_mode_nulls_bad_values_and_strict_mode_fails() {
    let csv = "\
id,name,email,phone,address,update_date,age
1,a@x.com,Alice,111,Rua A,2024-01-01T00:00:00,thirty
2,c@x.com,Carol,333,Rua C,2024-01-15T00:00:00,40
";
    let mapping = r#"{"update_date": "timestamp", "age": "integer"}"#;

    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), csv, mapping, "");
    let outcome = run_job(&config).expect("coerce run");
    assert_eq!(outcome.report.results.cast_nulls_total, 1);
    assert_eq!(outcome.report.cast_nulls[0].column, "age");
    let df = read_output(dir.path());
    let ages = df.column("age").expect("age").i32().expect("i32");
    assert_eq!(ages.get(0), None);
    assert_eq!(ages.get(1), Some(40));

    let strict_dir = tempfile::tempdir().expect("temp dir");
    let strict_config = write_job(
        strict_dir.path(),
        csv,
        mapping,
        "source:\n  cast_mode: strict\n",
    );
    let err = run_job(&strict_config).expect_err("strict run");
    assert!(err.to_string().contains("column age: 1 value(s) failed to cast to integer"));
    assert!(!output_dir(strict_dir.path()).exists());
}

#[test]
fn custom_locations_and_separator_are_honoured() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("raw")).expect("raw dir");
    fs::write(
        root.join("raw/users.csv"),
        "user;id;name;email;phone;address;modified\n7;70;a@x.com;Alice;1;A;2024-01-01T00:00:00\n",
    )
    .expect("csv");
    fs::write(
        root.join("raw/types.json"),
        r#"{"user": "long", "modified": "timestamp"}"#,
    )
    .expect("mapping");
    let config = root.join("job.yml");
    fs::write(
        &config,
        r#"version: "0.1"
storage:
  type: local
source:
  path: raw/users.csv
  options:
    separator: ";"
mapping:
  path: raw/types.json
sink:
  path: clean/users
  options:
    compression: zstd
dedup:
  key: user
  order_by: modified
"#,
    )
    .expect("config");

    let outcome = run_job(&config).expect("run");
    assert_eq!(outcome.report.results.rows_written, 1);
    let file = fs::File::open(root.join("clean/users/part-00000.parquet")).expect("parquet");
    let df = ParquetReader::new(file).finish().expect("read");
    assert_eq!(df.column("user").expect("user").dtype(), &DataType::Int64);
    assert_eq!(
        df.column("email").expect("email").str().expect("str").get(0),
        Some("a@x.com")
    );
}
