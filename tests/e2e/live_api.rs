//! E2E Scenario: the real development API
//!
//! Ignored by default. Run with credentials in the environment:
//!
//! ```text
//! HAUTO_EMAIL=... HAUTO_PASSWORD=... cargo test --test e2e live_ -- --ignored --test-threads=1
//! ```
//!
//! Each test runs the chain up to the stage it names, so a failure in an
//! earlier stage shows up as that stage failing rather than as a skipped
//! assertion.

use hauto_e2e::auth::{self, Credentials};
use hauto_e2e::chain::{ChainOptions, ChainReport, ChainRunner, Stage, StageStatus};
use hauto_e2e::client::ApiContext;
use hauto_e2e::config::Config;
use hauto_e2e::error::Result;

fn live_config() -> Result<Config> {
    let root = std::env::current_dir()?;
    Config::load(None, &root)
}

fn run_until(stage: Stage) -> Result<ChainReport> {
    let config = live_config()?;
    let credentials = Credentials::try_from(&config.credentials)?;
    let session = ApiContext::new(&config.api)?;
    let options = ChainOptions {
        refresh_bearer: config.run.refresh_bearer,
        until: None,
    };
    Ok(ChainRunner::new(&session, &credentials, &config.data, options).run_until(stage))
}

fn assert_stage_passed(report: &ChainReport, stage: Stage) {
    assert!(
        report.success(),
        "chain failed before {stage}: {:?}",
        report.first_failure()
    );
    let result = report.stage(stage).expect("stage was visited");
    assert_eq!(result.status, StageStatus::Passed);
    if let Some(expected) = stage.expected_status() {
        assert_eq!(result.http_status, Some(expected));
    }
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_login_returns_access_token() -> Result<()> {
    let config = live_config()?;
    let credentials = Credentials::try_from(&config.credentials)?;
    let session = ApiContext::new(&config.api)?;
    let token = auth::login(&session, &credentials)?;
    assert!(!token.as_str().is_empty());
    Ok(())
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_create_workspace() -> Result<()> {
    let report = run_until(Stage::CreateWorkspace)?;
    assert_stage_passed(&report, Stage::CreateWorkspace);
    assert!(report.entities.workspace_id.is_some());
    Ok(())
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_create_topic() -> Result<()> {
    let report = run_until(Stage::CreateTopic)?;
    assert_stage_passed(&report, Stage::CreateTopic);
    Ok(())
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_create_skill() -> Result<()> {
    let report = run_until(Stage::CreateSkill)?;
    assert_stage_passed(&report, Stage::CreateSkill);
    Ok(())
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_create_step() -> Result<()> {
    let report = run_until(Stage::CreateStep)?;
    assert_stage_passed(&report, Stage::CreateStep);
    Ok(())
}

#[test]
#[ignore = "talks to the live API; needs HAUTO_EMAIL and HAUTO_PASSWORD"]
fn live_create_widget() -> Result<()> {
    let report = run_until(Stage::CreateWidget)?;
    assert_stage_passed(&report, Stage::CreateWidget);
    assert!(report.entities.step_id.is_some());
    Ok(())
}
