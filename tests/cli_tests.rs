//! End-to-end runs of the optgen binary: real argument parsing, real glob
//! resolution, real files.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, starts_with};

fn optgen() -> Command {
    Command::cargo_bin("optgen").expect("binary builds")
}

fn write_unit(dir: &tempfile::TempDir) -> (String, String) {
    let ops = dir.path().join("ops.opt");
    let norm = dir.path().join("norm.opt");
    fs::write(
        &ops,
        "define True {}\ndefine Select {\n    Input Expr\n    Filter Expr\n}\n",
    )
    .expect("write ops.opt");
    fs::write(
        &norm,
        "[EliminateSelect]\n(Select $input:* (True)) => $input\n",
    )
    .expect("write norm.opt");
    (
        ops.display().to_string(),
        norm.display().to_string(),
    )
}

#[test]
fn exprs_emits_banner_to_stderr_and_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ops, norm) = write_unit(&dir);

    optgen()
        .args(["exprs", &ops, &norm])
        .assert()
        .success()
        .stderr(starts_with("// Code generated by optgen; DO NOT EDIT.\n"));
}

#[test]
fn out_flag_redirects_generated_code_to_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ops, norm) = write_unit(&dir);
    let out = dir.path().join("ops_gen.rs");

    optgen()
        .args(["--out", &out.display().to_string(), "ops", &ops, &norm])
        .assert()
        .success()
        .stderr(predicates::str::is_empty());

    let written = fs::read_to_string(&out).expect("read generated file");
    assert!(written.contains("pub enum Operator"));
    assert!(written.contains("Operator::Select"));
}

#[test]
fn glob_sources_resolve_and_sort() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_unit(&dir);
    let pattern = dir.path().join("*.opt").display().to_string();

    optgen()
        .args(["compile", &pattern])
        .assert()
        .success()
        .stderr(contains("define Select").and(contains("[EliminateSelect]")));
}

#[test]
fn compile_errors_exit_two_with_located_diagnostics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bad = dir.path().join("bad.opt");
    fs::write(&bad, "[R]\n(Missing) => \"x\"\n").expect("write bad.opt");

    optgen()
        .args(["compile", &bad.display().to_string()])
        .assert()
        .code(2)
        .stderr(contains(":2:1: unrecognized operator name 'Missing'"));
}

#[test]
fn missing_source_file_exits_two() {
    optgen()
        .args(["compile", "no_such_file.opt"])
        .assert()
        .code(2)
        .stderr(contains("failed to read no_such_file.opt"));
}

#[test]
fn unknown_command_prints_usage_and_exits_two() {
    optgen()
        .args(["frobnicate", "a.opt"])
        .assert()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn missing_arguments_print_usage_and_exit_two() {
    optgen().assert().code(2).stderr(contains("Usage"));
    optgen().args(["exprs"]).assert().code(2).stderr(contains("Usage"));
}

#[test]
fn compile_output_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ops, norm) = write_unit(&dir);
    let first_out = dir.path().join("first.opt");

    optgen()
        .args(["--out", &first_out.display().to_string(), "compile", &ops, &norm])
        .assert()
        .success();

    let second = optgen()
        .args(["compile", &first_out.display().to_string()])
        .assert()
        .success();
    let stderr = String::from_utf8(second.get_output().stderr.clone()).expect("UTF-8");
    let first = fs::read_to_string(&first_out).expect("read first output");
    assert_eq!(first, stderr);
}
