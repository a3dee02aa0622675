//! CLI front-end for the angler manifest engine.
//!
//! # Main modules
//! - [`cli`] — argument definitions (`clap` derive).
//! - [`commands`] — one module per subcommand.
//! - [`logging`] — `tracing-subscriber` initialization.
//! - [`error`] — CLI-level errors the engine itself doesn't raise.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

use cli::{Cli, Command};
use error::CliError;

/// Dispatches a parsed [`Cli`] to its subcommand. Returns the process exit
/// code: 0 on a clean run (even with per-node errors, which are only
/// logged), 1 on a cycle or SIGINT, 2 on store corruption or a duplicate
/// handler claiming the same scheme.
pub async fn run(cli: Cli) -> i32 {
    let result = dispatch(&cli).await;
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            exit_code_for(&err)
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Setup => commands::run_setup(&cli.manifest).map_err(CliError::from),
        Command::Add(args) => commands::run_add(&cli.manifest, args).await,
        Command::Order(args) => commands::run_order(&cli.manifest, args).await,
        Command::Apply(args) => match commands::run_apply(&cli.manifest, args).await? {
            commands::apply::Outcome::Completed => Ok(()),
            commands::apply::Outcome::Interrupted => Err(CliError::Interrupted),
        },
    }
}

fn exit_code_for(err: &CliError) -> i32 {
    use angler_core::error::{ManifestError, RegistryError};

    match err {
        CliError::Interrupted => 1,
        CliError::NotKeyValue(_) => 2,
        CliError::Manifest(ManifestError::Cycle(_)) => 1,
        CliError::Manifest(ManifestError::Store(_)) => 2,
        CliError::Manifest(ManifestError::Registry(RegistryError::DuplicateHandler { .. })) => 2,
        CliError::Manifest(_) => 2,
    }
}
