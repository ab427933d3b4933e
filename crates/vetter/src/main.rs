use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod identity;

use commands::Commands;

#[derive(Parser)]
#[command(name = "vetter", version, about = "Review change lifecycle: abandon, restore, batch abandon")]
struct Cli {
    /// Account to act as (defaults to ~/.vetter/identity.toml)
    #[arg(long, global = true, env = "VETTER_USER")]
    user: Option<String>,
    /// Group membership asserted for the acting account
    #[arg(long = "group", global = true)]
    groups: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = identity::resolve_principal(cli.user, cli.groups)
        .and_then(|principal| cli.command.run(&principal));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error::format_error(&err));
            ExitCode::FAILURE
        }
    }
}
