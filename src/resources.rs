//! Request payloads for the resources the chain creates.
//!
//! [`ChainData`] holds the canonical test data. Each creation stage builds
//! its body from it, so a run can be re-parameterised from config without
//! touching the fixtures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media item referenced by the default widget.
pub const DEFAULT_WIDGET_DATA_ID: &str = "6d9132b6-7d4b-48aa-b5c7-f341d7b86bfb";

/// Parameterised data for one chain run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainData {
    pub workspace_name: String,
    pub workspace_type: String,
    pub is_collaboration: bool,
    /// Topic names are this prefix plus four random hex characters.
    pub topic_prefix: String,
    pub skill_name: String,
    pub step_name: String,
    pub display_mode: String,
    pub is_shared: bool,
    /// Template used both for the widget embedded in the step and for the
    /// standalone widget stage.
    pub widget: WidgetPayload,
}

impl Default for ChainData {
    fn default() -> Self {
        Self {
            workspace_name: "dani".to_string(),
            workspace_type: "recruiting".to_string(),
            is_collaboration: false,
            topic_prefix: "123456".to_string(),
            skill_name: "skill".to_string(),
            step_name: "string".to_string(),
            display_mode: "progress".to_string(),
            is_shared: false,
            widget: WidgetPayload::default(),
        }
    }
}

impl ChainData {
    #[must_use]
    pub fn workspace(&self, org_id: &str) -> WorkspacePayload {
        WorkspacePayload {
            name: self.workspace_name.clone(),
            org_id: org_id.to_string(),
            workspace_type: self.workspace_type.clone(),
            is_collaboration: self.is_collaboration,
            members: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Topic payload with a fresh random name.
    #[must_use]
    pub fn topic(&self) -> TopicPayload {
        TopicPayload {
            name: format!("{}{}", self.topic_prefix, random_suffix()),
        }
    }

    #[must_use]
    pub fn skill(&self, workspace_id: &str, topic_id: &str) -> SkillPayload {
        SkillPayload {
            name: self.skill_name.clone(),
            workspace_id: workspace_id.to_string(),
            topic_id: topic_id.to_string(),
        }
    }

    #[must_use]
    pub fn step(&self) -> StepPayload {
        StepPayload {
            name: self.step_name.clone(),
            display_mode: self.display_mode.clone(),
            widgets: vec![self.widget.clone()],
            is_shared: self.is_shared,
        }
    }

    #[must_use]
    pub fn widget(&self) -> WidgetPayload {
        self.widget.clone()
    }
}

/// Four lowercase hex characters taken from a v4 UUID.
#[must_use]
pub fn random_suffix() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(4);
    simple
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePayload {
    pub name: String,
    pub org_id: String,
    #[serde(rename = "type")]
    pub workspace_type: String,
    pub is_collaboration: bool,
    pub members: Vec<serde_json::Value>,
    pub topics: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillPayload {
    pub name: String,
    pub workspace_id: String,
    pub topic_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPayload {
    pub name: String,
    pub display_mode: String,
    pub widgets: Vec<WidgetPayload>,
    pub is_shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPayload {
    pub widget_type: u32,
    pub description: String,
    pub is_required: bool,
    pub is_gradeable: bool,
    pub content: WidgetContent,
}

impl Default for WidgetPayload {
    fn default() -> Self {
        Self {
            widget_type: 1,
            description: String::new(),
            is_required: false,
            is_gradeable: false,
            content: WidgetContent::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetContent {
    pub source: u32,
    #[serde(rename = "type")]
    pub content_type: u32,
    pub data: String,
    pub data_id: String,
    pub description: String,
    pub options: WidgetOptions,
}

impl Default for WidgetContent {
    fn default() -> Self {
        Self {
            source: 101,
            content_type: 1,
            data: "string".to_string(),
            data_id: DEFAULT_WIDGET_DATA_ID.to_string(),
            description: String::new(),
            options: WidgetOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetOptions {
    pub start_at_timestamp: String,
    pub media_duration: u64,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            start_at_timestamp: "00:00".to_string(),
            media_duration: 0,
        }
    }
}
