use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI with an isolated data directory against `api`.
pub async fn run_cli(args: &[&str], data_dir: &Path, api: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_concierge"));
    cmd.args(args);
    cmd.env("CONCIERGE_DATA_DIR", data_dir);
    cmd.env("CONCIERGE_API", api);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");

    // The mock server needs the runtime while the binary runs.
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
        .await
        .expect("CLI task panicked")
}

/// Run the CLI and expect success.
pub async fn run_cli_success(args: &[&str], data_dir: &Path, api: &str) -> String {
    let output = run_cli(args, data_dir, api).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}
