//! E2E Scenario: `hauto-e2e` binary against the mock API
//!
//! Covers the exit code and report output of `run` and `login` in the
//! formats scripts rely on.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use super::fixture::{MockApi, Statuses, WIDGET_ID, WORKSPACE_ID};

fn hauto(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hauto-e2e").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("HAUTO_CONFIG")
        .env_remove("HAUTO_BASE_URL")
        .env_remove("HAUTO_EMAIL")
        .env_remove("HAUTO_PASSWORD")
        .env_remove("HAUTO_REFRESH_BEARER");
    cmd
}

#[test]
fn test_cli_run_json_report() {
    let mut api = MockApi::start("cli_run_json");
    let mocks = api.mount_chain();
    let dir = TempDir::new().unwrap();
    api.write_config(dir.path());

    api.log_step("hauto-e2e -m run");
    let output = hauto(&dir)
        .args(["-q", "-m", "run"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["passed"], 7);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["entities"]["workspace_id"], WORKSPACE_ID);
    assert_eq!(report["entities"]["widget_id"], WIDGET_ID);
    assert_eq!(report["stages"][1]["stage"], "create_workspace");
    assert_eq!(report["stages"][1]["http_status"], 201);

    mocks.login.assert_hits(2);
    mocks.widget.assert();
}

#[test]
fn test_cli_run_failure_exits_nonzero() {
    let mut api = MockApi::start("cli_run_failure");
    let mocks = api.mount_chain_with(Statuses {
        skill: 500,
        ..Statuses::default()
    });
    let dir = TempDir::new().unwrap();
    api.write_config(dir.path());

    api.log_step("hauto-e2e run with skill creation failing");
    hauto(&dir)
        .args(["-q", "run"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("create_skill"))
        .stdout(predicate::str::contains("4 passed, 1 failed, 2 skipped"))
        .stderr(predicate::str::contains("Chain failed at create_skill"));

    mocks.step.assert_hits(0);
    mocks.widget.assert_hits(0);
}

#[test]
fn test_cli_run_no_refresh_logs_in_once() {
    let mut api = MockApi::start("cli_run_no_refresh");
    let mocks = api.mount_chain_without_refresh();
    let dir = TempDir::new().unwrap();
    api.write_config(dir.path());

    api.log_step("hauto-e2e run --no-refresh --until create-skill");
    let output = hauto(&dir)
        .args(["-q", "-O", "jsonl", "run", "--no-refresh", "--until", "create-skill"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[2]["stage"], "refresh_bearer");
    assert_eq!(lines[2]["status"], "skipped");
    assert_eq!(lines[4]["stage"], "create_skill");
    assert_eq!(lines[4]["status"], "passed");

    mocks.login.assert_hits(1);
    mocks.skill.assert();
    mocks.step.assert_hits(0);
}

#[test]
fn test_cli_login_masks_token() {
    let mut api = MockApi::start("cli_login");
    let login = api.mount_login();
    let dir = TempDir::new().unwrap();
    api.write_config(dir.path());

    api.log_step("hauto-e2e -m login");
    hauto(&dir)
        .args(["-q", "-m", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"authenticated\""))
        .stdout(predicate::str::contains("token-..."))
        .stdout(predicate::str::contains("token-aaaaaaaa").not());

    login.assert();
}
