//! Depth-bounded recursive expansion of nodes/edges implied by a handler's
//! `node`, `incoming`, or `outgoing` hook.

use std::future::Future;
use std::pin::Pin;

use crate::error::ElaborationOverflow;
use crate::registry::{invoke, Declared, Registry};
use crate::store::{InsertOutcome, SqliteStore};
use crate::uri::Uri;

/// Recursion depth per root node before giving up and reporting an overflow.
pub const DEFAULT_DEPTH_BOUND: usize = 64;

/// Elaborates a freshly-inserted node: asks its handler what else must
/// exist, inserts those nodes/edges, and recurses into any that were
/// themselves genuinely new. Runs to completion on a best-effort basis —
/// missing handlers and malformed output are logged, never fatal.
pub async fn elaborate(
    store: &SqliteStore,
    registry: &Registry,
    root_uri: &str,
    depth_bound: usize,
) {
    elaborate_from(store, registry, root_uri, root_uri.to_string(), depth_bound, 0).await;
}

/// Elaborates a freshly-inserted edge: the source's handler gets `outgoing`
/// (reacting to a new edge leaving it), the sink's handler gets `incoming`
/// (reacting to a new edge entering it). Each side is its own elaboration
/// root with its own depth bound.
pub async fn elaborate_edge(
    store: &SqliteStore,
    registry: &Registry,
    source: &str,
    sink: &str,
    depth_bound: usize,
) {
    let (Ok(source_uri), Ok(sink_uri)) = (Uri::parse(source), Uri::parse(sink)) else {
        tracing::warn!(source, sink, "cannot elaborate edge with unparseable endpoint");
        return;
    };

    if let Some(handler) = registry.for_uri(&source_uri) {
        match invoke::edge_hook(handler, "outgoing", &source_uri, &sink_uri).await {
            Ok(declarations) => {
                process_declarations(store, registry, source, source, declarations, depth_bound, 0)
                    .await;
            }
            Err(e) => tracing::warn!(uri = source, error = %e, "handler outgoing hook failed"),
        }
    }

    if let Some(handler) = registry.for_uri(&sink_uri) {
        match invoke::edge_hook(handler, "incoming", &sink_uri, &source_uri).await {
            Ok(declarations) => {
                process_declarations(store, registry, sink, sink, declarations, depth_bound, 0).await;
            }
            Err(e) => tracing::warn!(uri = sink, error = %e, "handler incoming hook failed"),
        }
    }
}

/// Boxed so that an `async fn` may recurse into itself without an
/// unbounded-size future (stdlib `async fn` has no direct self-recursion).
fn elaborate_from<'a>(
    store: &'a SqliteStore,
    registry: &'a Registry,
    root: &'a str,
    uri: String,
    depth_bound: usize,
    depth: usize,
) -> Pin<Box<dyn Future<Output = ()> + 'a>> {
    Box::pin(elaborate_from_inner(store, registry, root, uri, depth_bound, depth))
}

async fn elaborate_from_inner(
    store: &SqliteStore,
    registry: &Registry,
    root: &str,
    uri_owned: String,
    depth_bound: usize,
    depth: usize,
) {
    let uri = uri_owned.as_str();

    if depth >= depth_bound {
        let overflow = ElaborationOverflow {
            root: root.to_string(),
            bound: depth_bound,
        };
        tracing::warn!(%overflow, "elaboration depth bound exceeded");
        return;
    }

    let parsed = match Uri::parse(uri) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(uri, error = %e, "cannot elaborate unparseable uri");
            return;
        }
    };

    let Some(handler) = registry.for_uri(&parsed) else {
        let e = crate::error::RegistryError::MissingHandler(parsed.scheme.clone());
        tracing::warn!(uri, error = %e, "skipping elaboration");
        return;
    };

    let declarations = match invoke::node(handler, &parsed).await {
        Ok(declarations) => declarations,
        Err(e) => {
            tracing::warn!(uri, error = %e, "handler node hook failed");
            return;
        }
    };

    process_declarations(store, registry, root, uri, declarations, depth_bound, depth).await;
}

/// Inserts the nodes/edges a hook declared, recursing into any node that
/// was genuinely new.
async fn process_declarations(
    store: &SqliteStore,
    registry: &Registry,
    root: &str,
    origin: &str,
    declarations: Vec<Declared>,
    depth_bound: usize,
    depth: usize,
) {
    for declared in declarations {
        match declared {
            Declared::Node {
                uri: implied_uri,
                value,
            } => match store.insert_node(&implied_uri, &value, Some(origin)) {
                Ok(InsertOutcome::Inserted) => {
                    elaborate_from(store, registry, root, implied_uri, depth_bound, depth + 1)
                        .await;
                }
                Ok(InsertOutcome::Noop) => {}
                Err(e) => {
                    tracing::warn!(uri = %implied_uri, error = %e, "elaboration insert_node failed");
                }
            },
            Declared::Edge { source, sink } => {
                if let Err(e) = store.insert_edge(&source, &sink, Some(origin)) {
                    tracing::warn!(%source, %sink, error = %e, "elaboration insert_edge failed");
                }
            }
        }
    }
}
