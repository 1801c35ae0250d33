//! Chain runner.
//!
//! Executes stages in order and collects a [`ChainReport`]. The first
//! failing stage halts the run; every later stage is reported as skipped
//! and never sends a request.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ChainOptions, ChainOutcome, ChainReport, Stage, StageResult, StageStatus};
use crate::auth::{self, BearerToken, Credentials};
use crate::client::{ApiContext, ApiResponse};
use crate::error::{ChainError, Result};
use crate::fixtures;
use crate::resources::ChainData;

/// State threaded from one stage to the next.
#[derive(Debug, Default)]
struct ChainState {
    outcome: ChainOutcome,
    /// Status of the current stage's response, set before any check runs.
    last_status: Option<u16>,
}

impl ChainState {
    fn active_bearer(&self) -> Result<&BearerToken> {
        self.outcome
            .active_bearer()
            .ok_or_else(|| ChainError::Auth("no bearer token; login stage did not run".to_string()))
    }

    fn record(&mut self, response: &ApiResponse) {
        self.last_status = Some(response.status);
    }
}

/// Runner for the fixture chain.
pub struct ChainRunner<'a> {
    ctx: &'a ApiContext,
    credentials: &'a Credentials,
    data: &'a ChainData,
    options: ChainOptions,
}

impl<'a> ChainRunner<'a> {
    pub fn new(
        ctx: &'a ApiContext,
        credentials: &'a Credentials,
        data: &'a ChainData,
        options: ChainOptions,
    ) -> Self {
        Self {
            ctx,
            credentials,
            data,
            options,
        }
    }

    /// Stop after `stage`.
    #[must_use]
    pub fn until(mut self, stage: Stage) -> Self {
        self.options.until = Some(stage);
        self
    }

    /// Stages this runner will visit.
    pub fn stages(&self) -> Vec<Stage> {
        self.options
            .until
            .map_or_else(|| Stage::ALL.to_vec(), Stage::prefix)
    }

    /// Run the chain up to `stage` regardless of the configured limit.
    pub fn run_until(&self, stage: Stage) -> ChainReport {
        self.execute(&stage.prefix()).0
    }

    /// Run the configured stages.
    pub fn run(&self) -> ChainReport {
        self.run_with_outcome().0
    }

    /// Run the configured stages and also hand back the ids and tokens obtained.
    pub fn run_with_outcome(&self) -> (ChainReport, ChainOutcome) {
        self.execute(&self.stages())
    }

    fn execute(&self, stages: &[Stage]) -> (ChainReport, ChainOutcome) {
        let run_id = format!("run-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            run_id = %run_id,
            base_url = %self.ctx.base_url(),
            stages = stages.len(),
            "Starting fixture chain"
        );

        let mut state = ChainState::default();
        let mut results = Vec::with_capacity(stages.len());
        let mut halted_at: Option<Stage> = None;

        for &stage in stages {
            if let Some(failed) = halted_at {
                results.push(StageResult::skipped(
                    stage,
                    format!("not run: upstream stage {failed} failed"),
                ));
                continue;
            }

            if stage == Stage::RefreshBearer && !self.options.refresh_bearer {
                results.push(StageResult::skipped(stage, "bearer refresh disabled"));
                continue;
            }

            let stage_start = Instant::now();
            state.last_status = None;
            let outcome = self.run_stage(stage, &mut state);
            let http_status = state.last_status.take();
            let duration_ms = elapsed_ms(stage_start);

            match outcome {
                Ok(entity_id) => {
                    info!(
                        run_id = %run_id,
                        stage = %stage,
                        status = ?http_status,
                        entity_id = ?entity_id,
                        duration_ms,
                        "Stage passed"
                    );
                    results.push(StageResult {
                        stage,
                        status: StageStatus::Passed,
                        http_status,
                        entity_id,
                        duration_ms,
                        failures: Vec::new(),
                    });
                }
                Err(err) => {
                    warn!(
                        run_id = %run_id,
                        stage = %stage,
                        status = ?http_status,
                        error = %err,
                        "Stage failed"
                    );
                    results.push(StageResult {
                        stage,
                        status: StageStatus::Failed,
                        http_status,
                        entity_id: None,
                        duration_ms,
                        failures: vec![err.to_string()],
                    });
                    halted_at = Some(stage);
                }
            }
        }

        let count = |status| results.iter().filter(|r| r.status == status).count();
        let passed = count(StageStatus::Passed);
        let failed = count(StageStatus::Failed);
        let skipped = count(StageStatus::Skipped);
        let duration_ms = elapsed_ms(start);

        info!(
            run_id = %run_id,
            passed,
            failed,
            skipped,
            duration_ms,
            "Fixture chain finished"
        );

        let report = ChainReport {
            run_id,
            started_at,
            base_url: self.ctx.base_url().to_string(),
            duration_ms,
            passed,
            failed,
            skipped,
            stages: results,
            entities: state.outcome.entities.clone(),
        };
        (report, state.outcome)
    }

    /// Run one stage; returns the id of the entity it created, if any.
    fn run_stage(&self, stage: Stage, state: &mut ChainState) -> Result<Option<String>> {
        match stage {
            Stage::Login => {
                let token = self.login(state)?;
                state.outcome.bearer = Some(token);
                Ok(None)
            }
            Stage::CreateWorkspace => {
                let response = fixtures::create_workspace(
                    self.ctx,
                    state.active_bearer()?,
                    self.data,
                    &self.credentials.org_id,
                )?;
                state.record(&response);
                let id = created_id(&response)?;
                state.outcome.entities.workspace_id = Some(id.clone());
                Ok(Some(id))
            }
            Stage::RefreshBearer => {
                warn!("Logging in again to pick up workspace permissions; no refresh endpoint is called");
                let token = self.login(state)?;
                state.outcome.refreshed_bearer = Some(token);
                Ok(None)
            }
            Stage::CreateTopic => {
                let workspace_id = require(state.outcome.entities.workspace_id.as_deref(), "workspace id")?;
                let response =
                    fixtures::create_topic(self.ctx, workspace_id, state.active_bearer()?, self.data)?;
                state.record(&response);
                let id = created_id(&response)?;
                state.outcome.entities.topic_id = Some(id.clone());
                Ok(Some(id))
            }
            Stage::CreateSkill => {
                let workspace_id = require(state.outcome.entities.workspace_id.as_deref(), "workspace id")?;
                let topic_id = require(state.outcome.entities.topic_id.as_deref(), "topic id")?;
                let response = fixtures::create_skill(
                    self.ctx,
                    workspace_id,
                    topic_id,
                    state.active_bearer()?,
                    self.data,
                )?;
                state.record(&response);
                let id = created_id(&response)?;
                state.outcome.entities.skill_id = Some(id.clone());
                Ok(Some(id))
            }
            Stage::CreateStep => {
                let skill_id = require(state.outcome.entities.skill_id.as_deref(), "skill id")?;
                let response =
                    fixtures::create_step(self.ctx, skill_id, state.active_bearer()?, self.data)?;
                state.record(&response);
                let id = created_id(&response)?;
                let has_widgets = response
                    .body
                    .get("widgets")
                    .and_then(Value::as_array)
                    .is_some_and(|widgets| !widgets.is_empty());
                if !has_widgets {
                    return Err(ChainError::AssertionFailed(format!(
                        "step {id} was created without widgets"
                    )));
                }
                state.outcome.entities.step_id = Some(id.clone());
                Ok(Some(id))
            }
            Stage::CreateWidget => {
                let skill_id = require(state.outcome.entities.skill_id.as_deref(), "skill id")?;
                let step_id = require(state.outcome.entities.step_id.as_deref(), "step id")?;
                let response = fixtures::create_widget(
                    self.ctx,
                    skill_id,
                    step_id,
                    state.active_bearer()?,
                    self.data,
                )?;
                state.record(&response);
                response.expect_status(fixtures::CREATED)?;
                // Widget bodies are not consumed downstream, so an id is optional.
                let id = response.id().ok();
                state.outcome.entities.widget_id.clone_from(&id);
                Ok(id)
            }
        }
    }

    fn login(&self, state: &mut ChainState) -> Result<BearerToken> {
        let response = auth::login_response(self.ctx, self.credentials)?;
        state.record(&response);
        let token = auth::bearer_from_response(&response)?;
        info!(email = %self.credentials.email, token = %token, "Logged in");
        Ok(token)
    }
}

/// Assert 201 and return the created resource's id.
fn created_id(response: &ApiResponse) -> Result<String> {
    response.expect_status(fixtures::CREATED)?;
    response.id()
}

fn require<'s>(value: Option<&'s str>, what: &str) -> Result<&'s str> {
    value.ok_or_else(|| ChainError::AssertionFailed(format!("{what} not available from earlier stages")))
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
