use std::path::Path;
use std::process::{Command, Output};

fn categorize(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_categorize"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should run")
}

#[test]
fn test_sample_writes_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = categorize(&["sample", "--output", "in/sample.csv"], dir.path());
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let text = std::fs::read_to_string(dir.path().join("in/sample.csv")).unwrap();
    assert!(text.starts_with("company_name,revenue\n"));
    assert_eq!(text.lines().count(), 11);
}

#[test]
fn test_categories_lists_builtin_table() {
    let dir = tempfile::tempdir().unwrap();
    let out = categorize(&["categories"], dir.path());
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Fashion & Personal Accessories"));
    assert!(stdout.contains("Services, Trade & Institutions"));
}

#[test]
fn test_categories_rejects_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yml"), "categories: []\n").unwrap();
    let out = categorize(&["categories", "--categories", "bad.yml"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("empty"));
}

#[test]
fn test_run_rejects_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let out = categorize(&["run", "--input", "missing.csv"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Input file not found"));
}

#[test]
fn test_run_rejects_too_many_workers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.csv"), "Equinor ASA,1\n").unwrap();
    let out = categorize(&["run", "--input", "in.csv", "--workers", "99"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("workers must be between 1 and 32"));
}
