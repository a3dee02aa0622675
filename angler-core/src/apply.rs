//! The reconciliation (apply) loop: for each scheduled node, observe its
//! current state via the handler and drive it toward the desired value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::registry::{self, Registry};
use crate::schedule;
use crate::store::Snapshot;
use crate::uri::Uri;

/// A flag a caller can set from a signal handler to stop scheduling further
/// nodes once the in-flight handler invocation returns. Cloning shares the
/// same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options controlling one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub swap: bool,
    pub dryrun: bool,
    pub verify: bool,
}

/// Counters accumulated over a run, reported regardless of per-node errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Runs one apply pass over a snapshot, honoring the stage order the
/// scheduler produces. Never fails on a per-node handler error; only a
/// cycle in the snapshot aborts the run entirely.
pub async fn apply(
    snapshot: &Snapshot,
    registry: &Registry,
    options: &ApplyOptions,
    cancel: Option<&Cancellation>,
) -> Result<RunSummary, crate::error::CycleError> {
    let stages = schedule::schedule(snapshot, options.swap)?;
    let mut summary = RunSummary::default();

    'stages: for stage in &stages {
        for uri_str in stage {
            apply_node(snapshot, registry, options, uri_str, &mut summary).await;
            if cancel.is_some_and(Cancellation::is_set) {
                tracing::warn!("run cancelled; stopping after in-flight handler invocation");
                break 'stages;
            }
        }
    }

    tracing::info!(
        run = summary.run,
        skipped = summary.skipped,
        errors = summary.errors,
        "apply run complete"
    );
    Ok(summary)
}

async fn apply_node(
    snapshot: &Snapshot,
    registry: &Registry,
    options: &ApplyOptions,
    uri_str: &str,
    summary: &mut RunSummary,
) {
    let Some(node) = snapshot.nodes.iter().find(|n| n.uri == uri_str) else {
        return;
    };

    let parsed = match Uri::parse(uri_str) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(uri = uri_str, error = %e, "cannot apply unparseable uri");
            summary.errors += 1;
            return;
        }
    };

    let Some(handler) = registry.for_uri(&parsed) else {
        let e = crate::error::RegistryError::MissingHandler(parsed.scheme.clone());
        tracing::error!(uri = uri_str, error = %e, "no handler registered");
        summary.errors += 1;
        return;
    };

    let current = match registry::invoke::get(handler, &parsed).await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!(uri = uri_str, error = %e, "get failed");
            summary.errors += 1;
            return;
        }
    };

    if states_equal(&current, &node.value) {
        tracing::debug!(uri = uri_str, "skip: already in desired state");
        summary.skipped += 1;
        return;
    }

    if options.dryrun {
        tracing::info!(uri = uri_str, ?current, desired = ?node.value, "would apply");
        summary.run += 1;
        return;
    }

    if let Err(e) = registry::invoke::set(handler, &parsed, &current, &node.value).await {
        tracing::error!(uri = uri_str, error = %e, "set failed");
        summary.errors += 1;
        return;
    }
    summary.run += 1;

    if options.verify {
        match registry::invoke::get(handler, &parsed).await {
            Ok(after) if states_equal(&after, &node.value) => {
                tracing::debug!(uri = uri_str, "verify: state matches");
            }
            Ok(after) => {
                tracing::warn!(uri = uri_str, ?after, desired = ?node.value, "verify: state still diverges");
            }
            Err(e) => {
                tracing::warn!(uri = uri_str, error = %e, "verify get failed");
            }
        }
    }
}

/// Deep JSON equality: the single top-level key is the state class, its
/// value the property map to compare.
fn states_equal(current: &Value, desired: &Value) -> bool {
    current == desired
}
