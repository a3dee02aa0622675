//! SQLite-backed implementation of the graph store.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::StoreError;

use super::{Edge, InsertOutcome, Node, Snapshot};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS node(
        uri TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        author TEXT
    );
    CREATE TABLE IF NOT EXISTS edge(
        source TEXT NOT NULL,
        sink TEXT NOT NULL,
        author TEXT,
        PRIMARY KEY(source, sink) ON CONFLICT REPLACE
    );
";

/// A durable node/edge relation backed by a SQLite file. One manifest per
/// file. Every insert commits before returning; concurrent writers are not
/// supported, concurrent readers are (guarded here by a connection mutex
/// since a single `rusqlite::Connection` is not `Sync`).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens an existing manifest file without touching its schema.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a fresh store, overwriting any existing tables, per the CLI's
    /// `setup` command.
    pub fn setup(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("DROP TABLE IF EXISTS node; DROP TABLE IF EXISTS edge;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a store backed by an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts or updates a node, applying the value-conflict rule: equal
    /// values no-op, a stored null is overwritten, a new null is dropped,
    /// and anything else conflicts.
    pub fn insert_node(
        &self,
        uri: &str,
        value: &Value,
        author: Option<&str>,
    ) -> Result<InsertOutcome, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let existing: Option<String> = conn
            .query_row(
                "SELECT value FROM node WHERE uri = ?1",
                params![uri],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            None => {
                let value_json = serde_json::to_string(value)
                    .expect("serde_json::Value always serializes");
                conn.execute(
                    "INSERT INTO node(uri, value, author) VALUES (?1, ?2, ?3)",
                    params![uri, value_json, author],
                )?;
                Ok(InsertOutcome::Inserted)
            }
            Some(stored_json) => {
                let stored: Value =
                    serde_json::from_str(&stored_json).map_err(|source| StoreError::Corrupt {
                        uri: uri.to_string(),
                        source,
                    })?;
                if stored == *value {
                    return Ok(InsertOutcome::Noop);
                }
                if stored.is_null() {
                    let value_json = serde_json::to_string(value)
                        .expect("serde_json::Value always serializes");
                    conn.execute(
                        "UPDATE node SET value = ?2, author = ?3 WHERE uri = ?1",
                        params![uri, value_json, author],
                    )?;
                    return Ok(InsertOutcome::Inserted);
                }
                if value.is_null() {
                    return Ok(InsertOutcome::Noop);
                }
                Err(StoreError::ValueConflict {
                    uri: uri.to_string(),
                    stored,
                    new: value.clone(),
                })
            }
        }
    }

    /// Inserts an edge; idempotent because `(source, sink)` is a primary key
    /// with replace-on-conflict semantics.
    pub fn insert_edge(
        &self,
        source: &str,
        sink: &str,
        author: Option<&str>,
    ) -> Result<InsertOutcome, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let existed: bool = conn
            .query_row(
                "SELECT 1 FROM edge WHERE source = ?1 AND sink = ?2",
                params![source, sink],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        conn.execute(
            "INSERT INTO edge(source, sink, author) VALUES (?1, ?2, ?3)
             ON CONFLICT(source, sink) DO UPDATE SET author = excluded.author",
            params![source, sink, author],
        )?;
        Ok(if existed {
            InsertOutcome::Noop
        } else {
            InsertOutcome::Inserted
        })
    }

    /// A consistent read of the whole graph, used to seed scheduling.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let mut node_stmt = conn.prepare("SELECT uri, value, author FROM node")?;
        let nodes = node_stmt
            .query_map([], |row| {
                let uri: String = row.get(0)?;
                let value_json: String = row.get(1)?;
                let author: Option<String> = row.get(2)?;
                Ok((uri, value_json, author))
            })?
            .map(|row| {
                let (uri, value_json, author) = row?;
                let value = serde_json::from_str(&value_json).map_err(|source| {
                    StoreError::Corrupt {
                        uri: uri.clone(),
                        source,
                    }
                })?;
                Ok(Node {
                    uri,
                    value,
                    author,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut edge_stmt = conn.prepare("SELECT source, sink, author FROM edge")?;
        let edges = edge_stmt
            .query_map([], |row| {
                Ok(Edge {
                    source: row.get(0)?,
                    sink: row.get(1)?,
                    author: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        Ok(Snapshot { nodes, edges })
    }
}
