//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use concierge_core::LoginCredentials;

use crate::output;
use crate::session::CliContext;

use super::whoami::print_expiry;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email or username to authenticate with
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long, env = "CONCIERGE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(api: Option<&str>, args: LoginArgs) -> Result<()> {
    let ctx = CliContext::for_login(api)?;
    let credentials = LoginCredentials::new(args.identifier, args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let session = ctx
        .client()
        .login(&credentials)
        .await
        .context("Failed to login")?;

    ctx.persist().context("Failed to save session")?;

    output::success("Logged in successfully");
    println!();
    output::field("API", ctx.api().as_str());
    print_expiry(&session);

    Ok(())
}
