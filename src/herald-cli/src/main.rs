//! Herald console - main entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use herald_cli::{Cli, LogLevel};

fn init_logging(level: LogLevel) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    herald_cli::run(cli).await
}
