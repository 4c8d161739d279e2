use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Single target with --dry-run should print the normalized URL and exit 0.
#[test]
fn test_single_target_dry_run() {
    cargo_bin_cmd!("cybak")
        .args(&["example.com", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would audit: https://example.com"));
}

/// List file with --dry-run should validate every line, skipping comments and duplicates.
#[test]
fn test_list_file_dry_run() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# shops").unwrap();
    writeln!(file, "http://target1.com").unwrap();
    writeln!(file, "target2.com").unwrap();
    writeln!(file, "target2.com").unwrap();

    let path = file.path().to_str().unwrap().to_string();

    cargo_bin_cmd!("cybak")
        .args(&["-l", &path, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would audit: http://target1.com"))
        .stdout(predicate::str::contains("[DRY RUN] Would audit: https://target2.com"))
        .stdout(predicate::str::contains("Loaded 3 target(s)"));
}

/// Running with no arguments is a usage error, not a partial batch.
#[test]
fn test_no_args_shows_error() {
    cargo_bin_cmd!("cybak")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No targets specified"));
}

/// --help still exits cleanly.
#[test]
fn test_help_succeeds() {
    cargo_bin_cmd!("cybak")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXAMPLES"));
}

/// An input that is not a URL is reported and turns the exit code to 2.
#[test]
fn test_invalid_target_dry_run() {
    cargo_bin_cmd!("cybak")
        .args(&["not a url", "--dry-run"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("invalid URL"));
}

/// A missing list file is a usage error.
#[test]
fn test_missing_list_file() {
    cargo_bin_cmd!("cybak")
        .args(&["-l", "/definitely/not/here.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

/// Unknown languages are rejected as a usage error.
#[test]
fn test_unknown_lang_rejected() {
    cargo_bin_cmd!("cybak")
        .args(&["example.com", "--lang", "de", "--dry-run"])
        .assert()
        .code(1);
}

/// --json prints the report as a single JSON document on stdout.
#[test]
fn test_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jsonl");

    let assert = cargo_bin_cmd!("cybak")
        .args(&["example.com", "--json", "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["url"], "https://example.com");
    let score = report["score"].as_u64().unwrap();
    assert!(score == 40 || score == 50);
    assert_eq!(report["grade"], "F");
    assert_eq!(report["vulnerabilities"].as_array().unwrap().len(), 3);
    assert_eq!(report["nextSteps"].as_array().unwrap().len(), 5);

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 1);
}

/// A --json batch writes one JSON document per report to stdout.
#[test]
fn test_json_batch_reports_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jsonl");

    let mut list = NamedTempFile::new().unwrap();
    writeln!(list, "a.com").unwrap();
    writeln!(list, "b.com").unwrap();
    let list_path = list.path().to_str().unwrap().to_string();

    let assert = cargo_bin_cmd!("cybak")
        .args(&["-l", &list_path, "--json", "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let reports: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&stdout)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(reports.len(), 2);

    let mut urls: Vec<&str> = reports.iter().map(|r| r["url"].as_str().unwrap()).collect();
    urls.sort();
    assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
}

/// French reports carry French titles.
#[test]
fn test_french_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jsonl");

    let assert = cargo_bin_cmd!("cybak")
        .args(&["http://example.com", "--json", "--lang", "fr", "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["vulnerabilities"][0]["severity"], "critical");
    assert_eq!(report["vulnerabilities"][0]["title"], "Site non sécurisé (HTTP)");
}

/// --store persists one completed record per audited target.
#[test]
fn test_store_persists_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audits.json");
    let output = dir.path().join("out.jsonl");

    let mut list = NamedTempFile::new().unwrap();
    writeln!(list, "a.com").unwrap();
    writeln!(list, "b.com/shop").unwrap();
    let list_path = list.path().to_str().unwrap().to_string();

    cargo_bin_cmd!("cybak")
        .args(&[
            "-l", &list_path,
            "--store", store.to_str().unwrap(),
            "--user", "alice",
            "-o", output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 audit(s) completed"));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    let records = doc["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record["userId"], "alice");
        assert_eq!(record["status"], "completed");
    }
}

/// A batch with an invalid entry still audits the rest but exits with 2.
#[test]
fn test_partial_batch_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jsonl");

    let mut list = NamedTempFile::new().unwrap();
    writeln!(list, "a.com").unwrap();
    writeln!(list, "not a url").unwrap();
    let list_path = list.path().to_str().unwrap().to_string();

    cargo_bin_cmd!("cybak")
        .args(&["-l", &list_path, "-o", output.to_str().unwrap()])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("1 invalid input(s) skipped"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 1);
}
