//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(api: Option<&str>, _args: LogoutArgs) -> Result<()> {
    let ctx = CliContext::open(api)?;

    // The local session is cleared whatever the server says.
    let result = ctx.client().logout().await;
    ctx.persist().context("Failed to clear saved session")?;

    if let Err(e) = result {
        warn!(error = %e, "Server rejected logout");
        output::warning(&format!("Server rejected logout: {}", e));
    }

    output::success("Logged out");
    Ok(())
}
