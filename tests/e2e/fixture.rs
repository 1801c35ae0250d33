//! E2E fixture: a local stand-in for the Hauto API plus step logging.
//!
//! The mock endpoints match on method, path, the Accept header, the bearer
//! token and (where the payload is deterministic) the exact JSON body, so a
//! passing chain proves the requests were shaped correctly.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{Value, json};

use hauto_e2e::auth::Credentials;
use hauto_e2e::config::{Config, DEFAULT_ACCEPT};
use hauto_e2e::resources::ChainData;

pub const EMAIL: &str = "qa@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const ORG_ID: &str = "org-0001";
/// Token issued by the first login.
pub const TOKEN: &str = "token-aaaaaaaa";
/// Token issued by every later login.
pub const REFRESHED_TOKEN: &str = "token-bbbbbbbb";

pub const WORKSPACE_ID: &str = "ws-0001";
pub const TOPIC_ID: &str = "tp-0001";
pub const SKILL_ID: &str = "sk-0001";
pub const STEP_ID: &str = "st-0001";
pub const WIDGET_ID: &str = "wd-0001";

/// Status each creation endpoint answers with.
#[derive(Debug, Clone, Copy)]
pub struct Statuses {
    pub workspace: u16,
    pub topic: u16,
    pub skill: u16,
    pub step: u16,
    pub widget: u16,
}

impl Default for Statuses {
    fn default() -> Self {
        Self {
            workspace: 201,
            topic: 201,
            skill: 201,
            step: 201,
            widget: 201,
        }
    }
}

/// Handles to every mounted endpoint, for hit-count assertions.
pub struct ChainMocks<'a> {
    pub login: Mock<'a>,
    pub workspace: Mock<'a>,
    pub topic: Mock<'a>,
    pub skill: Mock<'a>,
    pub step: Mock<'a>,
    pub widget: Mock<'a>,
}

pub struct MockApi {
    pub scenario_name: String,
    pub server: MockServer,
    start_time: Instant,
    step_count: Cell<usize>,
}

impl MockApi {
    pub fn start(scenario_name: &str) -> Self {
        let server = MockServer::start();

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Mock API: {}", server.base_url());
        println!();

        Self {
            scenario_name: scenario_name.to_string(),
            server,
            start_time: Instant::now(),
            step_count: Cell::new(0),
        }
    }

    /// Log a step in the E2E workflow.
    pub fn log_step(&self, description: &str) {
        self.step_count.set(self.step_count.get() + 1);
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count.get(), description);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    pub fn credentials() -> Credentials {
        Credentials::new(EMAIL, PASSWORD, ORG_ID)
    }

    /// Config pointing at this mock with the test account filled in.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.api.base_url = self.server.base_url();
        config.credentials.email = EMAIL.to_string();
        config.credentials.password = PASSWORD.to_string();
        config.credentials.org_id = ORG_ID.to_string();
        config
    }

    /// Write a project config file for CLI runs and return its path.
    pub fn write_config(&self, dir: &Path) -> PathBuf {
        let path = dir.join("hauto-e2e.toml");
        let raw = format!(
            "[api]\nbase_url = \"{}\"\n\n[credentials]\nemail = \"{EMAIL}\"\npassword = \"{PASSWORD}\"\norg_id = \"{ORG_ID}\"\n",
            self.server.base_url()
        );
        std::fs::write(&path, raw).expect("Failed to write config");
        println!("[E2E] Config written: {}", path.display());
        path
    }

    /// Login endpoint: [`TOKEN`] on the first call, [`REFRESHED_TOKEN`] after.
    pub fn mount_login(&self) -> Mock<'_> {
        let logins = AtomicUsize::new(0);
        self.server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/login")
                .header("accept", DEFAULT_ACCEPT)
                .json_body(json!({
                    "email": EMAIL,
                    "password": PASSWORD,
                    "org_id": ORG_ID
                }));
            then.respond_with(move |_: &HttpMockRequest| {
                let token = if logins.fetch_add(1, Ordering::SeqCst) == 0 {
                    TOKEN
                } else {
                    REFRESHED_TOKEN
                };
                HttpMockResponse::builder()
                    .status(200)
                    .header("content-type", "application/json")
                    .body(json!({"access_token": token, "token_type": "bearer"}).to_string())
                    .build()
            });
        })
    }

    /// Mount all six endpoints with 201s everywhere.
    pub fn mount_chain(&self) -> ChainMocks<'_> {
        self.mount_chain_with(Statuses::default())
    }

    /// Mount all six endpoints answering with `statuses`. Stages after the
    /// workspace only match the refreshed token.
    pub fn mount_chain_with(&self, statuses: Statuses) -> ChainMocks<'_> {
        self.mount(statuses, REFRESHED_TOKEN)
    }

    /// Mount all six endpoints for a run that never logs in a second time.
    pub fn mount_chain_without_refresh(&self) -> ChainMocks<'_> {
        self.mount(Statuses::default(), TOKEN)
    }

    fn mount(&self, statuses: Statuses, later_token: &str) -> ChainMocks<'_> {
        let data = ChainData::default();
        let first = format!("bearer {TOKEN}");
        let bearer = format!("bearer {later_token}");

        let login = self.mount_login();

        let workspace = self.server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/workspaces/")
                .header("accept", DEFAULT_ACCEPT)
                .header("authorization", first.as_str())
                .json_body(to_value(&data.workspace(ORG_ID)));
            then.status(statuses.workspace).json_body(json!({
                "id": WORKSPACE_ID,
                "name": data.workspace_name,
                "org_id": ORG_ID,
                "type": data.workspace_type,
                "is_collaboration": false,
                "members": [],
                "topics": []
            }));
        });

        let topic = self.server.mock(|when, then| {
            when.method(POST)
                .path(format!("/api/v1/workspaces/{WORKSPACE_ID}/topics/"))
                .header("authorization", bearer.as_str());
            then.status(statuses.topic)
                .json_body(json!({"id": TOPIC_ID, "name": "123456beef"}));
        });

        let skill = self.server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/skills/")
                .header("authorization", bearer.as_str())
                .json_body(to_value(&data.skill(WORKSPACE_ID, TOPIC_ID)));
            then.status(statuses.skill).json_body(json!({
                "id": SKILL_ID,
                "name": data.skill_name,
                "workspace_id": WORKSPACE_ID,
                "topic_id": TOPIC_ID
            }));
        });

        let step_body = to_value(&data.step());
        let step = self.server.mock(|when, then| {
            when.method(POST)
                .path(format!("/api/v1/skills/{SKILL_ID}/steps/"))
                .header("authorization", bearer.as_str())
                .json_body(step_body.clone());
            let mut created = step_body.clone();
            created["id"] = json!(STEP_ID);
            then.status(statuses.step).json_body(created);
        });

        let widget_body = to_value(&data.widget());
        let widget = self.server.mock(|when, then| {
            when.method(POST)
                .path(format!("/api/v1/skills/{SKILL_ID}/steps/{STEP_ID}/widgets/"))
                .header("authorization", bearer.as_str())
                .json_body(widget_body.clone());
            let mut created = widget_body.clone();
            created["id"] = json!(WIDGET_ID);
            then.status(statuses.widget).json_body(created);
        });

        ChainMocks {
            login,
            workspace,
            topic,
            skill,
            step,
            widget,
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E CLEANUP: {}", self.scenario_name);
        println!("█ Total time: {:?}", self.start_time.elapsed());
        println!("{}", "█".repeat(70));
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("payload serializes")
}
