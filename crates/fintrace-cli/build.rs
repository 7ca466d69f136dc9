use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let commit = env::var("GITHUB_SHA")
        .ok()
        .filter(|sha| !sha.is_empty())
        .or_else(|| git(&["rev-parse", "HEAD"]));
    let short = commit
        .as_deref()
        .map(|sha| sha.chars().take(7).collect::<String>())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let date = git(&["log", "-1", "--format=%cs"]).unwrap_or_else(|| UNKNOWN.to_string());

    println!("cargo:rustc-env=FINTRACE_BUILD_COMMIT={short}");
    println!("cargo:rustc-env=FINTRACE_BUILD_DATE={date}");
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}
