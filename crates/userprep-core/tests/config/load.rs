use std::fs;

use userprep_core::config::{self, CastMode, StorageResolver};
use userprep_core::{validate, ValidateOptions};

#[test]
fn validate_without_config_uses_builtin_locations() {
    let job = validate(ValidateOptions::default()).expect("defaults");
    assert_eq!(job.storage.bucket.as_deref(), Some("teste-eng-dados"));
    assert_eq!(job.source.path, "data/input/users/load.csv");
    assert_eq!(job.mapping.path, "config/types_mapping.json");
    assert_eq!(job.sink.path, "data/output/output.parquet");
    assert_eq!(job.source.cast_mode().expect("cast mode"), CastMode::Coerce);
}

#[test]
fn default_locations_resolve_inside_the_default_bucket() {
    let job = config::JobConfig::default();
    let resolver = StorageResolver::new(&job, std::path::Path::new("."));
    let input = resolver
        .resolve_path("source.path", &job.source.path)
        .expect("input");
    let output = resolver
        .resolve_path("sink.path", &job.sink.path)
        .expect("output");
    assert_eq!(input.uri, "s3://teste-eng-dados/data/input/users/load.csv");
    assert_eq!(output.uri, "s3://teste-eng-dados/data/output/output.parquet");
}

#[test]
fn validate_reports_invalid_config_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("job.yml");
    fs::write(
        &path,
        "version: \"0.1\"\nstorage:\n  type: local\nsink:\n  path: data/input/users/load.csv\nsource:\n  path: data/input/users/load.csv\n",
    )
    .expect("write config");

    let err = validate(ValidateOptions {
        config: Some(path),
    })
    .expect_err("sink equals source");
    assert!(err.to_string().contains("sink.path must differ from source.path"));
}

#[test]
fn local_paths_resolve_against_the_config_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("job.yml");
    fs::write(&path, "version: \"0.1\"\nstorage:\n  type: local\n").expect("write config");

    let job = config::load_job_config(Some(&path)).expect("load");
    let config_dir = config::config_dir(Some(&path)).expect("config dir");
    let resolver = StorageResolver::new(&job, &config_dir);
    let mapping = resolver
        .resolve_path("mapping.path", &job.mapping.path)
        .expect("mapping");
    assert_eq!(
        mapping.local_path,
        Some(dir.path().join("config/types_mapping.json"))
    );
}
