//! netfan binary entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use netfan_cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // RUST_LOG=debug for per-command output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Cli::parse().run().await
}
