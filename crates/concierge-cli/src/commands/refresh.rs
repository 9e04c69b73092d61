//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::CliContext;

use super::whoami::print_expiry;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(api: Option<&str>, _args: RefreshArgs) -> Result<()> {
    let ctx = CliContext::open(api)?;

    eprintln!("{}", "Refreshing session...".dimmed());

    let result = ctx.client().refresh().await;

    // A failed refresh logs out; persisting drops the stale cookie too.
    ctx.persist().context("Failed to save session")?;
    let session = result.context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    print_expiry(&session);

    Ok(())
}
