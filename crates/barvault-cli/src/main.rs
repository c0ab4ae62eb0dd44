mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code().into());
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Download(args) => commands::download::run(args).await,
        Command::Append(args) => commands::append::run(args),
    }
}
