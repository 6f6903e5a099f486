//! End-to-end subprocess tests for the `tacc` binary: the only crate in
//! the workspace with a process exit code and stdout/file-write contract
//! to assert on, so it is the natural owner of an `assert_cmd` test.

use assert_cmd::Command;
use predicates::prelude::*;

fn tacc() -> Command {
    Command::cargo_bin("tacc").unwrap()
}

#[test]
fn compiles_valid_source_and_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("test.txt");
    std::fs::write(&input, "def x = 1\nfn add(a, b) {\nreturn a + b\n}\n").unwrap();
    let out_dir = dir.path().join("steps");

    tacc()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("tokens.json").exists());
    assert!(out_dir.join("ast.json").exists());
}

#[test]
fn fatal_parse_error_exits_nonzero_with_caret_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.txt");
    std::fs::write(&input, "def = 5\n").unwrap();

    tacc()
        .arg(&input)
        .arg("--out-dir")
        .arg(dir.path().join("steps"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("parse error:"))
        .stderr(predicate::str::contains("Expected token"));
}

#[test]
fn missing_source_file_exits_nonzero() {
    tacc()
        .arg("/nonexistent/path/to/source.txt")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn emit_tokens_stops_before_writing_ast() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("test.txt");
    std::fs::write(&input, "def x = 1\n").unwrap();
    let out_dir = dir.path().join("steps");

    tacc()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--emit")
        .arg("tokens")
        .assert()
        .success();

    assert!(out_dir.join("tokens.json").exists());
    assert!(!out_dir.join("ast.json").exists());
}
