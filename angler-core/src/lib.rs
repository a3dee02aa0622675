//! Core engine for angler: a persistent, URI-addressed graph of desired
//! configuration state, reconciled against pluggable out-of-process
//! handlers.
//!
//! # Modules
//! - [`uri`] — the scheme/host/path/query/fragment codec used as node identity.
//! - [`store`] — the SQLite-backed node/edge relation and its conflict rules.
//! - [`registry`] — handler discovery and the wire protocol.
//! - [`elaborate`] — recursive expansion of nodes/edges a handler implies.
//! - [`schedule`] — topological ordering of a graph snapshot.
//! - [`apply`] — the get/compare/set reconciliation loop.
//! - [`manifest`] — the façade tying the above together for the CLI.
//!
//! # Quick start
//! ```rust,no_run
//! # async fn run() -> Result<(), angler_core::error::ManifestError> {
//! use angler_core::manifest::Manifest;
//! use angler_core::apply::ApplyOptions;
//! use serde_json::json;
//!
//! let manifest = Manifest::setup("angler.manifest")?;
//! manifest.insert_node("path:///tmp/demo", &json!({"folder": {}}), None).await?;
//! let summary = manifest.run_once(&ApplyOptions::default(), None).await?;
//! println!("{summary:?}");
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod elaborate;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod schedule;
pub mod store;
pub mod uri;

pub use error::ManifestError;
pub use manifest::Manifest;
