//! `hauto-e2e config` - print the effective configuration.

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::{ChainError, Result};

pub fn run(ctx: &AppContext) -> Result<()> {
    let redacted = ctx.config.redacted();
    if ctx.output_format.is_machine_readable() {
        return emit_json(&redacted);
    }

    let rendered = toml::to_string_pretty(&redacted)
        .map_err(|err| ChainError::Config(format!("serialize config: {err}")))?;
    println!("# project root: {}", ctx.project_root.display());
    print!("{rendered}");
    Ok(())
}
