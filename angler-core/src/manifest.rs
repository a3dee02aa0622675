//! The façade the CLI drives: `setup`/`open`/`insert_node`/`insert_edge`/`run_once`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::apply::{self, ApplyOptions, Cancellation, RunSummary};
use crate::elaborate;
use crate::error::ManifestError;
use crate::registry::{Registry, DEFAULT_HANDLER_DIR};
use crate::store::{InsertOutcome, SqliteStore};

/// A handle on one manifest file plus the handler search paths used to
/// resolve its nodes during elaboration and apply.
pub struct Manifest {
    store: SqliteStore,
    handler_dirs: Vec<PathBuf>,
}

impl Manifest {
    /// Creates a fresh store, overwriting any existing tables.
    pub fn setup(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let store = SqliteStore::setup(path)?;
        Ok(Manifest {
            store,
            handler_dirs: vec![PathBuf::from(DEFAULT_HANDLER_DIR)],
        })
    }

    /// Opens an existing store without touching its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let store = SqliteStore::open(path)?;
        Ok(Manifest {
            store,
            handler_dirs: vec![PathBuf::from(DEFAULT_HANDLER_DIR)],
        })
    }

    /// Overrides the handler search path used by elaboration and apply.
    pub fn with_handler_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.handler_dirs = dirs;
        self
    }

    /// Inserts a node and, if it was genuinely new, elaborates it.
    pub async fn insert_node(
        &self,
        uri: &str,
        value: &Value,
        author: Option<&str>,
    ) -> Result<InsertOutcome, ManifestError> {
        let outcome = self.store.insert_node(uri, value, author)?;
        if outcome.is_new() {
            let registry = Registry::discover(&self.handler_dirs).await?;
            elaborate::elaborate(&self.store, &registry, uri, elaborate::DEFAULT_DEPTH_BOUND).await;
        }
        Ok(outcome)
    }

    /// Inserts an edge and, if it was genuinely new, elaborates it by
    /// invoking the endpoints' `outgoing`/`incoming` hooks.
    pub async fn insert_edge(
        &self,
        source: &str,
        sink: &str,
        author: Option<&str>,
    ) -> Result<InsertOutcome, ManifestError> {
        let outcome = self.store.insert_edge(source, sink, author)?;
        if outcome.is_new() {
            let registry = Registry::discover(&self.handler_dirs).await?;
            elaborate::elaborate_edge(
                &self.store,
                &registry,
                source,
                sink,
                elaborate::DEFAULT_DEPTH_BOUND,
            )
            .await;
        }
        Ok(outcome)
    }

    /// Runs one reconciliation pass: snapshot, schedule, apply. `cancel`,
    /// if given, is checked between node invocations so a caller can stop
    /// the run early (e.g. on SIGINT) without aborting mid-handler-call.
    pub async fn run_once(
        &self,
        options: &ApplyOptions,
        cancel: Option<&Cancellation>,
    ) -> Result<RunSummary, ManifestError> {
        let snapshot = self.store.snapshot()?;
        let registry = Registry::discover(&self.handler_dirs).await?;
        let summary = apply::apply(&snapshot, &registry, options, cancel).await?;
        Ok(summary)
    }
}
