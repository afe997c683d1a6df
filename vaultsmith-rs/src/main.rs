//! vaultsmith CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vaultsmith::cli::{self, Cli, Output};
use vaultsmith::config::Config;
use vaultsmith::error::VaultError;
use vaultsmith::vault::Vault;

const LOG_ENV: &str = "VAULTSMITH_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), VaultError> {
    let config = Config::load()?;
    let vault_path = config.resolve_vault_path(cli.vault.as_deref())?;
    let vault = Vault::new(vault_path, config)?;
    let output = Output::new(cli.format, cli.quiet);
    cli::dispatch(&vault, &cli.command, &output)
}
