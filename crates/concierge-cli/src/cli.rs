//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{login, logout, refresh, request, whoami};

/// Command-line client for the hotel management API.
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(author, version = env!("CONCIERGE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL [default: the saved API, or http://localhost:3500]
    #[arg(long, env = "CONCIERGE_API", global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new session (login)
    Login(login::LoginArgs),

    /// Display the active session
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh cookie for a new access token
    Refresh(refresh::RefreshArgs),

    /// Send an authenticated request to the API
    Request(request::RequestArgs),

    /// End the session
    Logout(logout::LogoutArgs),
}
