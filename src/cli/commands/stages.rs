//! `hauto-e2e stages` - describe the chain.

use serde::Serialize;

use crate::app::AppContext;
use crate::chain::Stage;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, emit_jsonl};
use crate::error::Result;

#[derive(Debug, Serialize)]
struct StageInfo {
    order: usize,
    stage: Stage,
    method: &'static str,
    path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_status: Option<u16>,
}

fn describe() -> Vec<StageInfo> {
    Stage::ALL
        .iter()
        .enumerate()
        .map(|(index, stage)| StageInfo {
            order: index + 1,
            stage: *stage,
            method: "POST",
            path: stage.path_template(),
            expected_status: stage.expected_status(),
        })
        .collect()
}

pub fn run(ctx: &AppContext) -> Result<()> {
    let stages = describe();
    match ctx.output_format {
        OutputFormat::Json => emit_json(&stages),
        OutputFormat::Jsonl => emit_jsonl(&stages),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout.title("Fixture chain stages");
            for info in &stages {
                let expect = info
                    .expected_status
                    .map_or_else(|| "access_token".to_string(), |code| code.to_string());
                layout.push_line(format!(
                    "{:>2}. {:<17} {} {}  -> {expect}",
                    info.order,
                    info.stage.name(),
                    info.method,
                    info.path
                ));
            }
            emit_human(layout);
            Ok(())
        }
    }
}
