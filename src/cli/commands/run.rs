//! `hauto-e2e run` - execute the fixture chain and print the report.

use clap::Args;
use console::style;

use crate::app::AppContext;
use crate::auth::Credentials;
use crate::chain::{ChainOptions, ChainReport, ChainRunner, Stage, StageResult, StageStatus};
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, emit_jsonl};
use crate::client::ApiContext;
use crate::error::{ChainError, Result};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop after this stage
    #[arg(long, value_enum)]
    pub until: Option<Stage>,

    /// Reuse the first bearer token instead of logging in again after the workspace exists
    #[arg(long)]
    pub no_refresh: bool,

    /// Override the API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let api = match &args.base_url {
        Some(url) => ctx.config.api.with_base_url(url)?,
        None => ctx.config.api.clone(),
    };

    let credentials = Credentials::try_from(&ctx.config.credentials)?;
    let options = ChainOptions {
        refresh_bearer: ctx.config.run.refresh_bearer && !args.no_refresh,
        until: args.until,
    };

    let session = ApiContext::new(&api)?;
    let report = ChainRunner::new(&session, &credentials, &ctx.config.data, options).run();
    session.dispose();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&report)?,
        OutputFormat::Jsonl => emit_jsonl(&report.stages)?,
        OutputFormat::Human => emit_human(render_report(&report)),
    }

    match report.first_failure() {
        None => Ok(()),
        Some(failure) => Err(ChainError::ChainFailed {
            stage: failure.stage.to_string(),
            reason: failure.failures.join("; "),
        }),
    }
}

fn render_report(report: &ChainReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title(&format!("Fixture chain {}", report.run_id))
        .kv("Base URL", &report.base_url)
        .kv("Started", &report.started_at.to_rfc3339())
        .kv("Duration", &format!("{}ms", report.duration_ms))
        .blank()
        .section("Stages");

    for result in &report.stages {
        layout.push_line(stage_line(result));
        if result.status != StageStatus::Passed {
            for failure in &result.failures {
                layout.push_line(format!("     {}", style(failure).dim()));
            }
        }
    }

    layout.blank();
    let summary = format!(
        "{} passed, {} failed, {} skipped",
        report.passed, report.failed, report.skipped
    );
    if report.success() {
        layout.push_line(style(format!("✓ {summary}")).green().to_string());
    } else {
        layout.push_line(style(format!("✗ {summary}")).red().to_string());
    }
    layout
}

fn stage_line(result: &StageResult) -> String {
    let marker = match result.status {
        StageStatus::Passed => style("✓").green(),
        StageStatus::Failed => style("✗").red(),
        StageStatus::Skipped => style("-").dim(),
    };
    let status = result
        .http_status
        .map_or_else(|| "---".to_string(), |code| code.to_string());
    let id = result
        .entity_id
        .as_deref()
        .map(|id| format!(" id={id}"))
        .unwrap_or_default();
    format!(
        "  {marker} {:<17} {status} {:>6}ms{id}",
        result.stage.name(),
        result.duration_ms
    )
}
