//! Graph store: persist nodes (uri → value) and edges (source → sink) with
//! the conflict rules of the data model, backed by SQLite.

mod sqlite;

pub use sqlite::SqliteStore;

use serde_json::Value;

/// A stored node: its URI, JSON value, and the URI of the node that caused
/// it to exist (`None` for operator-authored nodes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub uri: String,
    pub value: Value,
    pub author: Option<String>,
}

/// A stored edge: source must be reconciled before sink.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub source: String,
    pub sink: String,
    pub author: Option<String>,
}

/// The outcome of an `insert_node`/`insert_edge` call that did not raise a
/// conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// The store already reflected the requested state; no row was written.
    Noop,
}

impl InsertOutcome {
    /// True when the insert produced a genuinely new node/edge — the signal
    /// the elaboration driver uses to decide whether to recurse.
    pub fn is_new(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// A consistent snapshot of the whole graph, used to seed a scheduling run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
