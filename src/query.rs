//! Dependency query engine
//!
//! Two mirrored read operations over stored edges: `dependents` (what relies
//! on a node) and `dependencies` (what a node relies on). Both run a
//! breadth-expanding traversal that tracks the ordered path taken to reach
//! each candidate and refuses to revisit a node already on that path - this
//! terminates on cyclic graphs without blocking legitimate multiple-path
//! discovery of the same node via different routes.
//!
//! Hitting the depth limit is not an error; it bounds the result set and is
//! reported via `depth_limit_reached`. The engine is read-only and may run
//! concurrently with an in-progress write, in which case it observes a
//! partially updated graph (best-effort, by contract).

use serde::Serialize;

use crate::edge::DependencyKind;
use crate::storage::{GraphStore, NodeId};
use crate::{Error, Result};

/// Default traversal depth bound.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Optional result filter: files only, symbols only, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    All,
    FilesOnly,
    SymbolsOnly,
}

impl QueryScope {
    fn admits(&self, node: NodeId) -> bool {
        match self {
            QueryScope::All => true,
            QueryScope::FilesOnly => matches!(node, NodeId::File(_)),
            QueryScope::SymbolsOnly => matches!(node, NodeId::Symbol(_)),
        }
    }
}

/// One node reached by a traversal, at its minimum depth.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyHit {
    pub node: NodeId,
    pub name: String,
    pub dependency_type: DependencyKind,
    pub depth: u32,
}

/// Ordered traversal result: depth ascending, node id as tie-break.
#[derive(Debug, Serialize)]
pub struct TraversalResult {
    pub hits: Vec<DependencyHit>,
    pub depth_limit_reached: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Follow edges backwards: who points at the seed.
    Incoming,
    /// Follow edges forwards: what the seed points at.
    Outgoing,
}

/// Read-side engine over a [`GraphStore`].
pub struct DependencyQuery<'a> {
    store: &'a GraphStore,
}

impl<'a> DependencyQuery<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Everything that depends on `seed`, up to `max_depth` hops.
    pub fn dependents(
        &self,
        seed: NodeId,
        max_depth: u32,
        scope: QueryScope,
    ) -> Result<TraversalResult> {
        self.traverse(seed, max_depth, scope, Direction::Incoming)
    }

    /// Everything `seed` depends on, up to `max_depth` hops.
    pub fn dependencies(
        &self,
        seed: NodeId,
        max_depth: u32,
        scope: QueryScope,
    ) -> Result<TraversalResult> {
        self.traverse(seed, max_depth, scope, Direction::Outgoing)
    }

    fn hops(&self, node: NodeId, direction: Direction) -> Result<Vec<crate::storage::EdgeHop>> {
        match direction {
            Direction::Incoming => self.store.edges_in(node),
            Direction::Outgoing => self.store.edges_out(node),
        }
    }

    fn traverse(
        &self,
        seed: NodeId,
        max_depth: u32,
        scope: QueryScope,
        direction: Direction,
    ) -> Result<TraversalResult> {
        if self.store.node_name(seed)?.is_none() {
            return Err(Error::NodeNotFound(seed.to_string()));
        }

        // Each frontier entry carries the full path that reached it, seed
        // included; a candidate already on its own path is a cycle and is
        // not expanded.
        struct Frontier {
            node: NodeId,
            path: Vec<NodeId>,
        }

        let mut frontier = vec![Frontier { node: seed, path: vec![seed] }];
        // All discoveries, possibly one node at several depths via
        // different routes; deduplicated at assembly.
        let mut discovered: Vec<(NodeId, u32, DependencyKind)> = Vec::new();

        let mut depth = 0u32;
        while depth < max_depth && !frontier.is_empty() {
            let mut next = Vec::new();
            for entry in &frontier {
                for hop in self.hops(entry.node, direction)? {
                    if entry.path.contains(&hop.node) {
                        continue;
                    }
                    discovered.push((hop.node, depth + 1, hop.kind));
                    let mut path = entry.path.clone();
                    path.push(hop.node);
                    next.push(Frontier { node: hop.node, path });
                }
            }
            frontier = next;
            depth += 1;
        }

        // The limit truncated results only if a boundary node still had
        // somewhere new to go.
        let mut depth_limit_reached = false;
        if depth == max_depth {
            'boundary: for entry in &frontier {
                for hop in self.hops(entry.node, direction)? {
                    if !entry.path.contains(&hop.node) {
                        depth_limit_reached = true;
                        break 'boundary;
                    }
                }
            }
        }

        // Dedupe by node, keeping the minimum depth (and the edge kind seen
        // first at that depth).
        let mut best: std::collections::HashMap<NodeId, (u32, DependencyKind)> =
            std::collections::HashMap::new();
        for (node, d, kind) in discovered {
            match best.get(&node) {
                Some((existing, _)) if *existing <= d => {}
                _ => {
                    best.insert(node, (d, kind));
                }
            }
        }

        let mut hits = Vec::with_capacity(best.len());
        for (node, (d, kind)) in best {
            if node == seed || !scope.admits(node) {
                continue;
            }
            let name = self
                .store
                .node_name(node)?
                .ok_or_else(|| Error::NodeNotFound(node.to_string()))?;
            hits.push(DependencyHit {
                node,
                name,
                dependency_type: kind,
                depth: d,
            });
        }
        hits.sort_by(|a, b| a.depth.cmp(&b.depth).then(a.node.cmp(&b.node)));

        Ok(TraversalResult { hits, depth_limit_reached })
    }
}
