//! Argument definitions for the `angler` binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Declarative configuration-management engine.
#[derive(Debug, Parser)]
#[command(name = "angler", version, about)]
pub struct Cli {
    /// Manifest file to operate on.
    #[arg(short = 'm', long, global = true, default_value = "angler.manifest")]
    pub manifest: PathBuf,

    /// Increase log verbosity. Repeatable.
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a fresh manifest, overwriting any existing tables.
    Setup,

    /// Add a node, optionally with before/after edges.
    Add(AddArgs),

    /// Assert an order for a chain of two or more nodes.
    Order(OrderArgs),

    /// Run one reconciliation pass.
    Apply(ApplyArgs),
}

#[derive(Debug, clap::Args)]
pub struct AddArgs {
    /// URI of the node to add.
    pub uri: String,

    /// Status word, `key=value`, followed by any number of `key=value`
    /// properties. `status` alone ⇒ `{status: {}}`; `key=value` as the
    /// first token ⇒ `{"": {key: value}}`; absent ⇒ `{"": {}}`.
    pub rest: Vec<String>,

    /// This node must be reconciled before the named node.
    #[arg(short = 'b', long = "before", action = ArgAction::Append)]
    pub before: Vec<String>,

    /// This node must be reconciled after the named node.
    #[arg(short = 'a', long = "after", action = ArgAction::Append)]
    pub after: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct OrderArgs {
    /// Two or more URIs; an edge is inserted between each consecutive pair.
    #[arg(required = true, num_args = 1..)]
    pub nodes: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct ApplyArgs {
    /// Reverse tie-break order of nodes within each stage.
    #[arg(short = 's', long)]
    pub swap: bool,

    /// List what would be applied without making any changes.
    #[arg(short = 'n', long)]
    pub dryrun: bool,

    /// Re-check state with `get` after each `set`.
    #[arg(long)]
    pub verify: bool,

    /// Handler search directory. Repeatable; defaults to `./modules`.
    #[arg(short = 'H', long = "handlers", action = ArgAction::Append)]
    pub handlers: Vec<PathBuf>,
}
