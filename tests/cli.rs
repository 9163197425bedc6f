#![cfg(unix)]

mod common;

use std::path::Path;
use std::process::Command;

use serial_test::serial;

fn tfsmoke(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tfsmoke"))
        .current_dir(cwd)
        .args(args)
        .env_remove("TFSMOKE_TERRAFORM_DIR")
        .env_remove("TFSMOKE_TERRAFORM_BIN")
        .env_remove("TFSMOKE_NO_COLOR")
        .env_remove("TFSMOKE_TIMEOUT")
        .env("RUST_LOG", "off")
        .output()
        .expect("run tfsmoke")
}

fn parse_stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
#[serial]
fn plan_json_reports_passing_env() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = common::fake_terraform(tmp.path(), None);
    common::env_dir(tmp.path(), "envs/dev");

    let out = tfsmoke(
        tmp.path(),
        &["plan", "--terraform-bin", bin.to_str().unwrap(), "--format", "json"],
    );
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let json = parse_stdout_json(&out);
    assert_eq!(json[0]["dir"], "envs/dev");
    assert_eq!(json[0]["passed"], true);
    assert_eq!(json[0]["resource_count"], 2);
    assert_eq!(json[0]["changes"]["add"], 2);
}

#[test]
#[serial]
fn plan_fails_for_missing_env() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = common::fake_terraform(tmp.path(), None);

    let out = tfsmoke(
        tmp.path(),
        &[
            "plan",
            "--dir",
            "envs/missing",
            "--terraform-bin",
            bin.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    assert!(!out.status.success());

    let json = parse_stdout_json(&out);
    assert_eq!(json[0]["passed"], false);
    assert_eq!(json[0]["error_kind"], "configuration");
    assert!(common::calls(tmp.path()).is_empty());
}

#[test]
#[serial]
fn plan_parallel_runs_every_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = common::fake_terraform(tmp.path(), None);
    common::env_dir(tmp.path(), "envs/dev");
    common::env_dir(tmp.path(), "envs/stage");

    let out = tfsmoke(
        tmp.path(),
        &[
            "plan",
            "--dir",
            "envs/dev",
            "--dir",
            "envs/stage",
            "--parallel",
            "--terraform-bin",
            bin.to_str().unwrap(),
        ],
    );
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("envs/dev"));
    assert!(stdout.contains("envs/stage"));
    assert_eq!(stdout.matches("PASS").count(), 2);
    assert_eq!(common::calls(tmp.path()).len(), 6);
}

#[test]
#[serial]
fn plan_parallel_rejects_duplicate_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = common::fake_terraform(tmp.path(), None);
    common::env_dir(tmp.path(), "envs/dev");

    let out = tfsmoke(
        tmp.path(),
        &[
            "plan",
            "--dir",
            "envs/dev,envs/dev",
            "--parallel",
            "--terraform-bin",
            bin.to_str().unwrap(),
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("listed more than once"));
    assert!(common::calls(tmp.path()).is_empty());
}

#[test]
#[serial]
fn doctor_reports_version() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = common::fake_terraform(tmp.path(), None);

    let out = tfsmoke(
        tmp.path(),
        &["doctor", "--terraform-bin", bin.to_str().unwrap()],
    );
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "terraform 1.9.5 (linux_amd64)"
    );
}

#[test]
#[serial]
fn doctor_fails_without_terraform() {
    let tmp = tempfile::tempdir().unwrap();

    let out = tfsmoke(
        tmp.path(),
        &["doctor", "--terraform-bin", "tfsmoke-definitely-not-installed"],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not be started"));
}

#[test]
#[serial]
fn plan_accepts_binary_relative_to_cwd() {
    let tmp = tempfile::tempdir().unwrap();
    common::fake_terraform(tmp.path(), None);
    common::env_dir(tmp.path(), "envs/dev");
    std::fs::write(tmp.path().join("dev.tfvars"), "location = \"westeurope\"\n").unwrap();

    let doctor = tfsmoke(tmp.path(), &["doctor", "--terraform-bin", "./terraform"]);
    assert!(doctor.status.success());

    let out = tfsmoke(
        tmp.path(),
        &[
            "plan",
            "--terraform-bin",
            "./terraform",
            "--var-file",
            "dev.tfvars",
            "--format",
            "json",
        ],
    );
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let json = parse_stdout_json(&out);
    assert_eq!(json[0]["passed"], true);

    let calls = common::calls(tmp.path());
    let plan_call = calls.iter().find(|c| c.starts_with("plan ")).unwrap();
    let var_file = tmp.path().canonicalize().unwrap().join("dev.tfvars");
    assert!(
        plan_call.contains(&format!("-var-file {}", var_file.display()))
            || plan_call.contains(&format!("-var-file {}", tmp.path().join("dev.tfvars").display())),
        "plan call: {plan_call}"
    );
}
