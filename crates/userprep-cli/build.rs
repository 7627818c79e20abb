use std::env;
use std::process::Command;

fn main() {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let sha = env::var("GITHUB_SHA")
        .ok()
        .and_then(short_sha)
        .or_else(git_sha);

    match sha {
        Some(sha) => println!("cargo:rustc-env=USERPREP_VERSION={version} ({sha})"),
        None => println!("cargo:rustc-env=USERPREP_VERSION={version}"),
    }
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}

fn short_sha(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(7).collect())
    }
}

fn git_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    short_sha(String::from_utf8_lossy(&output.stdout).to_string())
}
