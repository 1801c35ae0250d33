//! Sequential fixture chain
//!
//! Runs login and the five creation calls in dependency order, feeding each
//! created id into the next call, and reports a result per stage.

pub mod runner;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::BearerToken;

pub use runner::ChainRunner;

/// One step of the chain, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Login,
    CreateWorkspace,
    /// Second login once the workspace exists.
    RefreshBearer,
    CreateTopic,
    CreateSkill,
    CreateStep,
    CreateWidget,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::Login,
        Self::CreateWorkspace,
        Self::RefreshBearer,
        Self::CreateTopic,
        Self::CreateSkill,
        Self::CreateStep,
        Self::CreateWidget,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CreateWorkspace => "create_workspace",
            Self::RefreshBearer => "refresh_bearer",
            Self::CreateTopic => "create_topic",
            Self::CreateSkill => "create_skill",
            Self::CreateStep => "create_step",
            Self::CreateWidget => "create_widget",
        }
    }

    /// Endpoint with `{placeholders}` for ids taken from earlier stages.
    #[must_use]
    pub const fn path_template(self) -> &'static str {
        match self {
            Self::Login | Self::RefreshBearer => "/api/v1/login",
            Self::CreateWorkspace => "/api/v1/workspaces/",
            Self::CreateTopic => "/api/v1/workspaces/{workspace_id}/topics/",
            Self::CreateSkill => "/api/v1/skills/",
            Self::CreateStep => "/api/v1/skills/{skill_id}/steps/",
            Self::CreateWidget => "/api/v1/skills/{skill_id}/steps/{step_id}/widgets/",
        }
    }

    /// Status the stage asserts. Login stages only require an `access_token`.
    #[must_use]
    pub const fn expected_status(self) -> Option<u16> {
        match self {
            Self::Login | Self::RefreshBearer => None,
            _ => Some(crate::fixtures::CREATED),
        }
    }

    /// Stages from `Login` up to and including `self`.
    #[must_use]
    pub fn prefix(self) -> Vec<Self> {
        Self::ALL.into_iter().filter(|stage| *stage <= self).collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for a chain run.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// Log in again after the workspace is created.
    pub refresh_bearer: bool,
    /// Stop after this stage instead of running the whole chain.
    pub until: Option<Stage>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            refresh_bearer: true,
            until: None,
        }
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    /// HTTP status of the stage's request, when one completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Identifier of the resource the stage created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl StageResult {
    pub(crate) fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            http_status: None,
            entity_id: None,
            duration_ms: 0,
            failures: vec![reason.into()],
        }
    }
}

/// Identifiers of everything a run created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
}

/// Ids and bearer tokens a run produced.
///
/// Kept out of [`ChainReport`] so tokens never reach printed output.
#[derive(Debug, Clone, Default)]
pub struct ChainOutcome {
    pub entities: CreatedEntities,
    /// Token from the first login.
    pub bearer: Option<BearerToken>,
    /// Token from the second login, after the workspace exists.
    pub refreshed_bearer: Option<BearerToken>,
}

impl ChainOutcome {
    /// Token creation calls carry: the refreshed one once it exists.
    pub fn active_bearer(&self) -> Option<&BearerToken> {
        self.refreshed_bearer.as_ref().or(self.bearer.as_ref())
    }
}

/// Report for one chain run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub duration_ms: u64,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub stages: Vec<StageResult>,
    pub entities: CreatedEntities,
}

impl ChainReport {
    /// True when no stage failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn first_failure(&self) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|result| result.status == StageStatus::Failed)
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|result| result.stage == stage)
    }
}
