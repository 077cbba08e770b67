// tests/cli_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(name);
    path
}

const SAMPLE_MIR: &str = "\
@function f ( )
%entry
x := 1
y := x + 2
%print y
%exit
@end function
";

#[test]
fn help_displays_correctly() {
    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn version_displays_correctly() {
    let version = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Command::cargo_bin("tacmir").unwrap().arg("--version").assert().success().stdout(predicate::str::contains(version));
}

#[test]
fn missing_subcommand_fails() {
    Command::cargo_bin("tacmir").unwrap().assert().failure();
}

#[test]
fn optimize_missing_input_argument_fails() {
    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("optimize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn optimize_nonexistent_file_reports_an_io_error() {
    let path = fixture_path("tacmir_cli_test_missing.mir");
    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("optimize")
        .arg("-i")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO"));
}

#[test]
fn optimize_writes_the_optimized_program_to_stdout() {
    let path = fixture_path("tacmir_cli_test_optimize.mir");
    std::fs::write(&path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("optimize")
        .arg("-i")
        .arg(&path)
        .arg("--sccp")
        .assert()
        .success()
        .stdout(predicate::str::contains("@function f"))
        .stdout(predicate::str::contains("[addr:"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn optimize_dry_run_produces_no_stdout() {
    let path = fixture_path("tacmir_cli_test_dry_run.mir");
    std::fs::write(&path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("optimize")
        .arg("-i")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn optimize_writes_to_the_requested_output_file() {
    let input = fixture_path("tacmir_cli_test_output_in.mir");
    let output = fixture_path("tacmir_cli_test_output_out.mir");
    std::fs::write(&input, SAMPLE_MIR).unwrap();

    Command::cargo_bin("tacmir").unwrap().arg("optimize").arg("-i").arg(&input).arg("-o").arg(&output).assert().success();

    let rendered = std::fs::read_to_string(&output).unwrap();
    assert!(rendered.contains("@function f"));

    std::fs::remove_file(&input).unwrap();
    std::fs::remove_file(&output).unwrap();
}

#[test]
fn analyze_reports_block_and_loop_counts() {
    let path = fixture_path("tacmir_cli_test_analyze.mir");
    std::fs::write(&path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("analyze")
        .arg("-i")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("function f"))
        .stdout(predicate::str::contains("blocks:"))
        .stdout(predicate::str::contains("loops:"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn optimize_rejects_the_unimplemented_dae_pre_algorithm() {
    let path = fixture_path("tacmir_cli_test_dae.mir");
    std::fs::write(&path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("tacmir")
        .unwrap()
        .arg("optimize")
        .arg("-i")
        .arg(&path)
        .arg("--pre")
        .arg("dae")
        .assert()
        .failure()
        .stderr(predicate::str::contains("UNIMPLEMENTED"));

    std::fs::remove_file(&path).unwrap();
}
