//! socialctl - command-line access to Discord, LinkedIn and Reddit user
//! accounts.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use socialctl::commands::Cli;
use socialctl::error;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SOCIALCTL_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
