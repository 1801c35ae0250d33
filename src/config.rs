use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};
use crate::resources::{ChainData, WidgetPayload};

/// Base URL of the development API the chain targets by default.
pub const DEFAULT_BASE_URL: &str = "https://api-dev.hauto.dev/";

/// Accept header sent on every request.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

/// Organisation the test account belongs to.
pub const DEFAULT_ORG_ID: &str = "5edfd39d-d9cd-43dc-ab36-748a03aed01d";

/// File name looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = "hauto-e2e.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub data: ChainData,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        Self::load_with(explicit_path, project_root, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with `HAUTO_*` variables read through `lookup`.
    pub fn load_with(
        explicit_path: Option<&Path>,
        project_root: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| lookup("HAUTO_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                ChainError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("hauto-e2e/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| ChainError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| ChainError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    /// Parse a TOML document as a patch over the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| ChainError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        Ok(config)
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.api {
            self.api.merge(patch);
        }
        if let Some(patch) = patch.credentials {
            self.credentials.merge(patch);
        }
        if let Some(patch) = patch.data {
            merge_data(&mut self.data, patch);
        }
        if let Some(patch) = patch.run {
            self.run.merge(patch);
        }
    }

    /// Apply `HAUTO_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("HAUTO_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = lookup("HAUTO_ACCEPT") {
            self.api.accept = value;
        }
        if let Some(value) = parse_u64(&lookup, "HAUTO_TIMEOUT_SECS")? {
            self.api.timeout = Some(Duration::from_secs(value));
        }

        if let Some(value) = lookup("HAUTO_EMAIL") {
            self.credentials.email = value;
        }
        if let Some(value) = lookup("HAUTO_PASSWORD") {
            self.credentials.password = value;
        }
        if let Some(value) = lookup("HAUTO_ORG_ID") {
            self.credentials.org_id = value;
        }

        if let Some(value) = lookup("HAUTO_WORKSPACE_NAME") {
            self.data.workspace_name = value;
        }
        if let Some(value) = lookup("HAUTO_TOPIC_PREFIX") {
            self.data.topic_prefix = value;
        }
        if let Some(value) = lookup("HAUTO_SKILL_NAME") {
            self.data.skill_name = value;
        }

        if let Some(value) = lookup("HAUTO_REFRESH_BEARER") {
            self.run.refresh_bearer = parse_bool(&value);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()
    }

    /// Copy safe to print: the password is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.credentials.password.is_empty() {
            copy.credentials.password = "********".to_string();
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Per-request timeout. Unset keeps the HTTP client's default.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            accept: default_accept(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Check the base URL scheme and the Accept header.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ChainError::Config(format!(
                "api.base_url must be an http(s) URL, got {base:?}"
            )));
        }
        if self.accept.trim().is_empty() {
            return Err(ChainError::Config("api.accept must not be empty".to_string()));
        }
        Ok(())
    }

    /// Copy with `base_url` replaced, validated.
    pub fn with_base_url(&self, base_url: &str) -> Result<Self> {
        let api = Self {
            base_url: base_url.to_string(),
            ..self.clone()
        };
        api.validate()?;
        Ok(api)
    }

    fn merge(&mut self, patch: ApiPatch) {
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.accept {
            self.accept = value;
        }
        if patch.timeout.is_some() {
            self.timeout = patch.timeout;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_org_id")]
    pub org_id: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            org_id: default_org_id(),
        }
    }
}

impl CredentialsConfig {
    fn merge(&mut self, patch: CredentialsPatch) {
        if let Some(value) = patch.email {
            self.email = value;
        }
        if let Some(value) = patch.password {
            self.password = value;
        }
        if let Some(value) = patch.org_id {
            self.org_id = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Log in a second time after the workspace exists and use that token
    /// for the remaining stages.
    #[serde(default = "default_true")]
    pub refresh_bearer: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            refresh_bearer: true,
        }
    }
}

impl RunConfig {
    fn merge(&mut self, patch: RunPatch) {
        if let Some(value) = patch.refresh_bearer {
            self.refresh_bearer = value;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    credentials: Option<CredentialsPatch>,
    data: Option<DataPatch>,
    run: Option<RunPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    accept: Option<String>,
    #[serde(default, with = "humantime_serde")]
    timeout: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsPatch {
    email: Option<String>,
    password: Option<String>,
    org_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    workspace_name: Option<String>,
    workspace_type: Option<String>,
    is_collaboration: Option<bool>,
    topic_prefix: Option<String>,
    skill_name: Option<String>,
    step_name: Option<String>,
    display_mode: Option<String>,
    is_shared: Option<bool>,
    widget: Option<WidgetPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct RunPatch {
    refresh_bearer: Option<bool>,
}

fn merge_data(data: &mut ChainData, patch: DataPatch) {
    if let Some(value) = patch.workspace_name {
        data.workspace_name = value;
    }
    if let Some(value) = patch.workspace_type {
        data.workspace_type = value;
    }
    if let Some(value) = patch.is_collaboration {
        data.is_collaboration = value;
    }
    if let Some(value) = patch.topic_prefix {
        data.topic_prefix = value;
    }
    if let Some(value) = patch.skill_name {
        data.skill_name = value;
    }
    if let Some(value) = patch.step_name {
        data.step_name = value;
    }
    if let Some(value) = patch.display_mode {
        data.display_mode = value;
    }
    if let Some(value) = patch.is_shared {
        data.is_shared = value;
    }
    if let Some(value) = patch.widget {
        data.widget = value;
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_accept() -> String {
    DEFAULT_ACCEPT.to_string()
}

fn default_org_id() -> String {
    DEFAULT_ORG_ID.to_string()
}

const fn default_true() -> bool {
    true
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match lookup(key) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| ChainError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
