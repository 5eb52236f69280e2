//! End-to-end CLI tests for the `ravel` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn ravel() -> Command {
    Command::cargo_bin("ravel").expect("binary built")
}

#[test]
fn happy_path_writes_a_report_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.txt");
    std::fs::write(
        &script,
        "# a small session\nA = Thompson a|b\nB = Determinize A\nEquiv A B\n",
    )
    .unwrap();

    ravel()
        .current_dir(dir.path())
        .arg("script.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("Equiv: true"));

    let report = dir.path().join("resources/report.tex");
    let body = std::fs::read_to_string(report).unwrap();
    assert!(body.contains("A = "));
    assert!(body.contains("Equiv"));
}

#[test]
fn user_prefix_names_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("s.txt");
    std::fs::write(&script, "A = Glushkov ab\n").unwrap();

    ravel()
        .current_dir(dir.path())
        .args(["s.txt", "bob-"])
        .assert()
        .success();

    assert!(dir.path().join("resources/bob-report.tex").exists());
}

#[test]
fn a_failing_line_makes_the_run_exit_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.txt");
    std::fs::write(&script, "A = Thompson a|b\nB = Complement A\n").unwrap();

    ravel()
        .current_dir(dir.path())
        .arg("script.txt")
        .assert()
        .failure()
        .stdout(predicate::str::contains("ERROR"));

    assert!(!dir.path().join("resources/report.tex").exists());
}

#[test]
fn missing_script_file_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    ravel()
        .current_dir(dir.path())
        .arg("does-not-exist.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
