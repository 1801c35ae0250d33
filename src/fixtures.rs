//! One function per creation call.
//!
//! Each fixture issues a single POST and hands back the raw response. They
//! never assert; the chain runner (or a test) decides what status is
//! acceptable and pulls the `id` out for the next fixture.

use tracing::debug;

use crate::auth::BearerToken;
use crate::client::{ApiContext, ApiResponse};
use crate::error::Result;
use crate::resources::ChainData;

/// Status every creation endpoint returns on success.
pub const CREATED: u16 = 201;

pub const WORKSPACES_PATH: &str = "/api/v1/workspaces/";
pub const SKILLS_PATH: &str = "/api/v1/skills/";

pub fn topics_path(workspace_id: &str) -> String {
    format!("/api/v1/workspaces/{workspace_id}/topics/")
}

pub fn steps_path(skill_id: &str) -> String {
    format!("/api/v1/skills/{skill_id}/steps/")
}

pub fn widgets_path(skill_id: &str, step_id: &str) -> String {
    format!("/api/v1/skills/{skill_id}/steps/{step_id}/widgets/")
}

pub fn create_workspace(
    ctx: &ApiContext,
    bearer: &BearerToken,
    data: &ChainData,
    org_id: &str,
) -> Result<ApiResponse> {
    let payload = data.workspace(org_id);
    debug!(name = %payload.name, org_id = %org_id, "Creating workspace");
    ctx.post_json(WORKSPACES_PATH, &payload, Some(bearer))
}

pub fn create_topic(
    ctx: &ApiContext,
    workspace_id: &str,
    bearer: &BearerToken,
    data: &ChainData,
) -> Result<ApiResponse> {
    let payload = data.topic();
    debug!(workspace_id = %workspace_id, name = %payload.name, "Creating topic");
    ctx.post_json(&topics_path(workspace_id), &payload, Some(bearer))
}

pub fn create_skill(
    ctx: &ApiContext,
    workspace_id: &str,
    topic_id: &str,
    bearer: &BearerToken,
    data: &ChainData,
) -> Result<ApiResponse> {
    let payload = data.skill(workspace_id, topic_id);
    debug!(workspace_id = %workspace_id, topic_id = %topic_id, "Creating skill");
    ctx.post_json(SKILLS_PATH, &payload, Some(bearer))
}

pub fn create_step(
    ctx: &ApiContext,
    skill_id: &str,
    bearer: &BearerToken,
    data: &ChainData,
) -> Result<ApiResponse> {
    let payload = data.step();
    debug!(skill_id = %skill_id, widgets = payload.widgets.len(), "Creating step");
    ctx.post_json(&steps_path(skill_id), &payload, Some(bearer))
}

pub fn create_widget(
    ctx: &ApiContext,
    skill_id: &str,
    step_id: &str,
    bearer: &BearerToken,
    data: &ChainData,
) -> Result<ApiResponse> {
    debug!(skill_id = %skill_id, step_id = %step_id, "Creating widget");
    ctx.post_json(&widgets_path(skill_id, step_id), &data.widget(), Some(bearer))
}
