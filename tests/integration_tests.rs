//! Integration tests for the batchbench CLI

use assert_cmd::Command;
use batchbench::bench::run_once;
use batchbench::parallel::{Backend, PoolConfig};
use batchbench::workload::{Workload, WorkloadKind};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn batchbench() -> Command {
    let mut cmd = Command::cargo_bin("batchbench").unwrap();
    // keep the developer's environment out of the sweep
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Tiny sweep that finishes quickly on any machine
fn small_run(cmd: &mut Command) -> &mut Command {
    cmd.args([
        "run",
        "--njobs",
        "0",
        "8",
        "--lengths",
        "20",
        "--batch-sizes",
        "1",
        "4",
        "--repeats",
        "1",
        "--workers",
        "2",
    ])
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    batchbench()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fastest batch size"))
        .stdout(predicate::str::contains("run"));

    batchbench()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch-size sweep benchmark"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    batchbench()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("batchbench"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    batchbench()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_text_report() {
    small_run(&mut batchbench())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("n_jobs grid: [0, 8]"))
        .stdout(predicate::str::contains("=== n_jobs=0  length=20 ==="))
        .stdout(predicate::str::contains("=== n_jobs=8  length=20 ==="))
        .stdout(predicate::str::contains(
            "=== Best batch size per configuration (by median time) ===",
        ));
}

#[test]
fn test_json_report() {
    let report = json_stdout(small_run(&mut batchbench()).args(["--format", "json"]));

    let groups = report["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["job_count"], 0);
    assert_eq!(groups[0]["baseline_secs"], 0.0);
    assert_eq!(groups[1]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(report["best"].as_array().unwrap().len(), 2);
}

#[test]
fn test_process_backend_matches_threads() {
    let run = |backend: &str| {
        json_stdout(batchbench().args([
            "run",
            "--backend",
            backend,
            "--workload",
            "spin",
            "--njobs",
            "9",
            "--lengths",
            "50",
            "--batch-sizes",
            "1",
            "2",
            "5",
            "--repeats",
            "1",
            "--workers",
            "2",
            "--format",
            "json",
        ]))
    };

    let threads = run("threads");
    let process = run("process");
    assert_eq!(process["backend"], "process");

    let checksums = |report: &serde_json::Value| -> Vec<serde_json::Value> {
        report["groups"][0]["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["checksum"].clone())
            .collect()
    };
    let expected = checksums(&threads);
    assert!(expected.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(checksums(&process), expected);
}

#[test]
fn test_invalid_arguments_fail_fast() {
    let cases: [(&[&str], &str); 4] = [
        (&["--repeats", "0"], "repeats must be at least 1"),
        (&["--workers", "0"], "worker count must be at least 1"),
        (&["--lengths", "0"], "lengths must be at least 1"),
        (&["--batch-sizes", "0"], "batch sizes must be at least 1"),
    ];

    for (args, message) in cases {
        batchbench()
            .args(["run", "--njobs", "1"])
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains(message));
    }
}

#[test]
fn test_project_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("batchbench.toml"),
        r#"
[sweep]
njobs = [3]
lengths = [5]
batch_sizes = [1, 2]
repeats = 1

[workload]
kind = "spin"
"#,
    )
    .unwrap();

    batchbench()
        .current_dir(temp_dir.path())
        .args(["run", "--workers", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("n_jobs grid: [3]"))
        .stdout(predicate::str::contains("workload=spin"));
}

#[test]
fn test_custom_config_and_env_override() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[sweep]\nnjobs = [2]\nlengths = [4]\nbatch_sizes = [1]\nrepeats = 1\n",
    )
    .unwrap();

    batchbench()
        .arg("--config")
        .arg(&config_path)
        .env("BATCHBENCH_SWEEP__REPEATS", "0")
        .args(["run", "--workers", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repeats must be at least 1"));

    batchbench()
        .arg("--config")
        .arg(&config_path)
        .args(["run", "--workers", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("length grid: [4]"));
}

#[test]
fn test_missing_config_file() {
    batchbench()
        .args(["--config", "does-not-exist.toml", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_profile_command() {
    batchbench()
        .args(["profile", "--workers", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "batchbench {} profile",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("Logical CPUs"))
        .stdout(predicate::str::contains("Workers"));
}

#[test]
fn test_process_pool_from_library() {
    let workload = Workload::new(WorkloadKind::ZScore, 40);
    let process = PoolConfig::new(Backend::Process, 2).with_program(env!("CARGO_BIN_EXE_batchbench"));
    let threads = PoolConfig::new(Backend::Threads, 2);

    let from_processes = run_once(&process, &workload, 20, 3).unwrap();
    let from_threads = run_once(&threads, &workload, 20, 3).unwrap();
    assert_eq!(from_processes.checksum, from_threads.checksum);
    assert_eq!(from_processes.batch_size, 3);
}

#[test]
fn test_worker_command_speaks_json_lines() {
    let request = r#"{"workload":{"kind":"spin","cost":3,"seed_stride":1},"start":0,"len":2}"#;
    batchbench()
        .arg("worker")
        .write_stdin(format!("{request}\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""start":0"#))
        .stdout(predicate::str::contains(r#"{"kind":"xor","value":5}"#));
}
