//! Topological scheduling over an immutable graph snapshot (Kahn's algorithm).

use std::collections::{BTreeSet, HashMap};

use crate::error::CycleError;
use crate::store::Snapshot;

/// A stage is the set of nodes with no remaining incoming edge, ready to be
/// reconciled together.
pub type Stage = Vec<String>;

/// Yields stages in dependency order: for edge `source -> sink`, `source`'s
/// stage always precedes `sink`'s. Ties within a stage break by URI,
/// ascending unless `swap` is set.
pub fn schedule(snapshot: &Snapshot, swap: bool) -> Result<Vec<Stage>, CycleError> {
    let mut in_degree: HashMap<&str, usize> = snapshot
        .nodes
        .iter()
        .map(|n| (n.uri.as_str(), 0usize))
        .collect();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &snapshot.edges {
        if let Some(count) = in_degree.get_mut(edge.sink.as_str()) {
            *count += 1;
        }
        outgoing
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.sink.as_str());
    }

    let mut remaining = in_degree.clone();
    let mut stages = Vec::new();

    while !remaining.is_empty() {
        let mut ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&uri, _)| uri)
            .collect();

        if ready.is_empty() {
            let members: BTreeSet<String> =
                remaining.keys().map(|&uri| uri.to_string()).collect();
            return Err(CycleError { members });
        }

        ready.sort_unstable();
        if swap {
            ready.reverse();
        }

        for &uri in &ready {
            remaining.remove(uri);
        }
        for &uri in &ready {
            if let Some(sinks) = outgoing.get(uri) {
                for &sink in sinks {
                    if let Some(count) = remaining.get_mut(sink) {
                        *count -= 1;
                    }
                }
            }
        }

        stages.push(ready.into_iter().map(str::to_string).collect());
    }

    Ok(stages)
}
