//! Typed error domains for the manifest engine.
//!
//! Each phase of a run (URI parsing, storage, handler discovery, elaboration,
//! scheduling, apply) raises its own error enum; [`ManifestError`] composes
//! them into the one error type the façade and CLI deal in.

use std::collections::BTreeSet;

use thiserror::Error;

/// URI codec failure.
#[derive(Debug, Error)]
pub enum UriError {
    #[error("unable to parse uri {0:?}")]
    Malformed(String),

    #[error("invalid path {0:?}: must start with '/'")]
    InvalidPath(String),
}

/// Graph store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "value conflict inserting {uri}: stored value {stored} cannot become {new}"
    )]
    ValueConflict {
        uri: String,
        stored: serde_json::Value,
        new: serde_json::Value,
    },

    #[error("store I/O error: {0}")]
    Io(#[from] rusqlite::Error),

    #[error("stored value for {uri} is not valid JSON: {source}")]
    Corrupt {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Handler discovery / invocation failure.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("scheme {scheme:?} is claimed by both {first} and {second}")]
    DuplicateHandler {
        scheme: String,
        first: String,
        second: String,
    },

    #[error("no handler registered for scheme {0:?}")]
    MissingHandler(String),

    #[error("handler {handler} failed on `{subcommand}`: {detail}")]
    HandlerFailure {
        handler: String,
        subcommand: String,
        detail: String,
    },

    #[error("handler {handler} timed out on `{subcommand}` after {timeout_secs}s")]
    Timeout {
        handler: String,
        subcommand: String,
        timeout_secs: u64,
    },

    #[error("failed to spawn handler {handler}: {source}")]
    Spawn {
        handler: String,
        #[source]
        source: std::io::Error,
    },
}

/// Raised when elaboration exceeds its configured recursion bound for a root node.
#[derive(Debug, Error)]
#[error("elaboration from {root} exceeded depth bound {bound}; stopping expansion")]
pub struct ElaborationOverflow {
    pub root: String,
    pub bound: usize,
}

/// Raised by the scheduler when the residual graph contains a cycle.
#[derive(Debug, Error)]
#[error("cycle detected among {} node(s): {}", .members.len(), format_members(.members))]
pub struct CycleError {
    pub members: BTreeSet<String>,
}

fn format_members(members: &BTreeSet<String>) -> String {
    members.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// The top-level error type returned by the manifest façade.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Cycle(#[from] CycleError),
}
