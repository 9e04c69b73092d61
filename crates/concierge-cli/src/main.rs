//! concierge - command-line client for the hotel management API.
//!
//! A thin wrapper over `concierge-core`: every request goes through the
//! re-authenticating client, with the session and refresh cookie kept on
//! disk between invocations.

mod cli;
mod commands;
mod navigator;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let api = cli.api.as_deref();
    match cli.command {
        Commands::Login(args) => commands::login::run(api, args).await,
        Commands::Whoami(args) => commands::whoami::run(api, args).await,
        Commands::Refresh(args) => commands::refresh::run(api, args).await,
        Commands::Request(args) => commands::request::run(api, args).await,
        Commands::Logout(args) => commands::logout::run(api, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
