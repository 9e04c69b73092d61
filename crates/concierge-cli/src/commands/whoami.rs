//! Whoami command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde_json::json;

use concierge_core::SessionCredentials;

use crate::output;
use crate::session::CliContext;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(api: Option<&str>, args: WhoamiArgs) -> Result<()> {
    let ctx = CliContext::open(api)?;
    let session = ctx
        .client()
        .session()
        .context("No active session. Run 'concierge login' first.")?;

    if args.json {
        return output::json(&json!({
            "api": ctx.api().as_str(),
            "expiresAt": session.expires_at,
            "expired": session.is_expired(),
        }));
    }

    output::field("API", ctx.api().as_str());
    print_expiry(&session);

    Ok(())
}

/// Print when the token expires. Never prints the token itself.
pub fn print_expiry(session: &SessionCredentials) {
    let expires = session
        .expires_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    output::field("Expires", &expires);
    output::field("Expired", if session.is_expired() { "yes" } else { "no" });

    if let Some(at) = session.expires_at
        && !session.is_expired()
    {
        let minutes = (at - Utc::now()).num_minutes();
        output::field("Remaining", &format!("{} min", minutes));
    }
}
