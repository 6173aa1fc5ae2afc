//! `steamsync` command-line entry point.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::run_command(cli))
}
