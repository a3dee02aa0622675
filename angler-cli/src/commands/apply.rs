use std::path::{Path, PathBuf};
use std::sync::Arc;

use angler_core::apply::{ApplyOptions, Cancellation};
use angler_core::manifest::Manifest;
use angler_core::registry::DEFAULT_HANDLER_DIR;

use crate::cli::ApplyArgs;
use crate::error::CliError;

/// Whether the run finished on its own or was cut short by SIGINT.
pub enum Outcome {
    Completed,
    Interrupted,
}

pub async fn run(manifest_path: &Path, args: &ApplyArgs) -> Result<Outcome, CliError> {
    let handler_dirs = if args.handlers.is_empty() {
        vec![PathBuf::from(DEFAULT_HANDLER_DIR)]
    } else {
        args.handlers.clone()
    };
    let manifest = Arc::new(Manifest::open(manifest_path)?.with_handler_dirs(handler_dirs));
    let options = ApplyOptions {
        swap: args.swap,
        dryrun: args.dryrun,
        verify: args.verify,
    };
    let cancel = Cancellation::new();

    let run_manifest = manifest.clone();
    let run_cancel = cancel.clone();
    let mut handle = tokio::spawn(async move { run_manifest.run_once(&options, Some(&run_cancel)).await });

    tokio::select! {
        result = &mut handle => {
            let summary = result.expect("apply task does not panic")?;
            tracing::info!(
                run = summary.run,
                skipped = summary.skipped,
                errors = summary.errors,
                "apply finished"
            );
            Ok(Outcome::Completed)
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received; stopping after the current handler invocation");
            cancel.set();
            let summary = handle.await.expect("apply task does not panic")?;
            tracing::info!(
                run = summary.run,
                skipped = summary.skipped,
                errors = summary.errors,
                "apply stopped early"
            );
            Ok(Outcome::Interrupted)
        }
    }
}
