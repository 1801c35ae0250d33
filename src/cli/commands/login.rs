//! `hauto-e2e login` - check the configured credentials.

use clap::Args;

use crate::app::AppContext;
use crate::auth::{self, Credentials};
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::client::ApiContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Override the API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

pub fn run(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let api = match &args.base_url {
        Some(url) => ctx.config.api.with_base_url(url)?,
        None => ctx.config.api.clone(),
    };

    let credentials = Credentials::try_from(&ctx.config.credentials)?;
    let session = ApiContext::new(&api)?;
    let token = auth::login(&session, &credentials)?;

    if ctx.output_format.is_machine_readable() {
        return emit_json(&serde_json::json!({
            "status": "authenticated",
            "email": credentials.email,
            "org_id": credentials.org_id,
            "base_url": session.base_url(),
            "token": token.masked(),
        }));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Login")
        .kv("Status", "Authenticated ✓")
        .kv("Email", &credentials.email)
        .kv("Org", &credentials.org_id)
        .kv("Base URL", session.base_url())
        .kv("Token", &token.masked());
    emit_human(layout);
    Ok(())
}
