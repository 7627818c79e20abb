use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{DataFrame, ParquetReader, SerReader};
use userprep_core::{run, RunOptions};

fn write_job(root: &Path, csv: &str) -> PathBuf {
    fs::create_dir_all(root.join("data/input/users")).expect("input dir");
    fs::create_dir_all(root.join("config")).expect("config dir");
    fs::write(root.join("data/input/users/load.csv"), csv).expect("write csv");
    fs::write(
        root.join("config/types_mapping.json"),
        r#"{"update_date": "timestamp"}"#,
    )
    .expect("write mapping");
    let config = root.join("job.yml");
    fs::write(&config, "version: \"0.1\"\nstorage:\n  type: local\n").expect("write config");
    config
}

fn run_job(config: &Path) {
    run(RunOptions {
        config: Some(config.to_path_buf()),
        run_id: None,
    })
    .expect("run");
}

fn output_dir(root: &Path) -> PathBuf {
    root.join("data/output/output.parquet")
}

fn read_output(root: &Path) -> DataFrame {
    let file = fs::File::open(output_dir(root).join("part-00000.parquet")).expect("open parquet");
    ParquetReader::new(file).finish().expect("read parquet")
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .expect("read output dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

const CSV: &str = "\
id,name,email,phone,address,update_date
3,c@x.com,Carol,333,Rua C,2024-01-15T00:00:00
1,a@x.com,Alice,111,Rua A,2024-01-01T00:00:00
1,b@x.com,Bob,222,Rua B,2024-02-01T00:00:00
";

#[test]
fn rerun_on_unchanged_input_is_idempotent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), CSV);

    run_job(&config);
    let first = read_output(dir.path());
    run_job(&config);
    let second = read_output(dir.path());

    assert!(first.equals_missing(&second));
    assert_eq!(
        listing(&output_dir(dir.path())),
        vec!["_SUCCESS", "part-00000.parquet"]
    );
}

#[test]
fn stale_part_files_are_removed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), CSV);
    let out = output_dir(dir.path());
    fs::create_dir_all(out.join("nested")).expect("stale dir");
    fs::write(out.join("part-00001-previous.parquet"), b"stale").expect("stale part");
    fs::write(out.join("nested/part-00002.parquet"), b"stale").expect("nested stale part");

    run(RunOptions {
        config: Some(config.clone()),
        run_id: Some("stale".to_string()),
    })
    .map(|outcome| assert_eq!(outcome.report.output.stale_removed, 2))
    .expect("run");

    assert!(!out.join("part-00001-previous.parquet").exists());
    assert!(!out.join("nested/part-00002.parquet").exists());
    assert_eq!(read_output(dir.path()).height(), 2);
}

#[test]
fn second_run_replaces_previous_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_job(dir.path(), CSV);
    run_job(&config);

    fs::write(
        dir.path().join("data/input/users/load.csv"),
        "id,name,email,phone,address,update_date\n9,z@x.com,Zed,999,Rua Z,2024-03-01T00:00:00\n",
    )
    .expect("rewrite csv");
    run_job(&config);

    let df = read_output(dir.path());
    assert_eq!(df.height(), 1);
    assert_eq!(df.column("id").expect("id").i32().expect("i32").get(0), Some(9));
}
