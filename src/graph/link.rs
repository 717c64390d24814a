//! Link/unlink engine
//!
//! Keeps two structures consistent while nodes and edges come and go:
//! - the `next` chain of every sequence (at most one predecessor and one
//!   successor per node)
//! - the shadow `child` edges from each span container to every chain member
//!   between its `first` and `last` targets
//!
//! The engine holds no state of its own; everything lives in the graph's
//! edge store.

use super::edge::Edge;
use super::store::Graph;
use super::traits::Trait;
use super::types::{EdgeType, NodeId};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

impl Graph {
    /// Run the link procedure on every node, in insertion order
    ///
    /// Used after bulk loads that added nodes unlinked.
    pub fn link_nodes(&mut self) {
        for id in self.get_node_ids() {
            self.link_node(&id);
        }
    }

    /// Link one node into the sequence and containers it participates in
    pub fn link_node(&mut self, id: &str) {
        if self.node_has_trait(id, Trait::Sequence) {
            self.connect(id);
        }
        if self.node_has_trait(id, Trait::SpanContainer) {
            self.connect_span_container_parents(id);
        }
    }

    /// First `next` target of a node
    pub(crate) fn successor(&self, id: &str) -> Option<NodeId> {
        self.targets_of_type(id, EdgeType::NEXT).into_iter().next()
    }

    /// First node with a `next` edge into this one
    pub(crate) fn predecessor(&self, id: &str) -> Option<NodeId> {
        self.sources_of_type(id, EdgeType::NEXT).into_iter().next()
    }

    /// Nodes holding a `child`, `first` or `last` edge into this one
    fn container_parents(&self, id: &str) -> IndexSet<NodeId> {
        self.in_edges(id)
            .into_iter()
            .filter(|edge| {
                edge.is_type(EdgeType::CHILD)
                    || edge.is_type(EdgeType::FIRST)
                    || edge.is_type(EdgeType::LAST)
            })
            .map(|edge| edge.source.clone())
            .collect()
    }

    /// Splice a freshly pointed node into the middle of a chain
    ///
    /// Applies when the node has a `next` edge to `B`, no predecessor of its
    /// own, and `B` already has a different predecessor `A`: `A -> B` becomes
    /// `A -> node -> B`. Containers covering both `A` and `B` gain a `child`
    /// edge to the node.
    pub fn connect(&mut self, id: &str) {
        let Some(successor) = self.successor(id) else {
            return;
        };
        if self.predecessor(id).is_some() {
            return;
        }
        let Some(predecessor) = self
            .sources_of_type(&successor, EdgeType::NEXT)
            .into_iter()
            .find(|source| source.as_str() != id)
        else {
            return;
        };

        debug!(
            node = id,
            predecessor = %predecessor,
            successor = %successor,
            "splicing node into sequence"
        );
        self.remove_edge(&predecessor, &successor, EdgeType::NEXT);
        self.add_edge(&predecessor, id, EdgeType::next(), None);

        let successor_parents = self.container_parents(&successor);
        let shared: Vec<NodeId> = self
            .container_parents(&predecessor)
            .into_iter()
            .filter(|parent| successor_parents.contains(parent))
            .collect();
        for parent in shared {
            if !self.edge_exists(&parent, id, EdgeType::CHILD) {
                self.add_edge(&parent, id, EdgeType::child(), None);
            }
        }
    }

    /// Add `child` edges from a span container to every chain member from its
    /// `first` target to its `last` target, inclusive
    ///
    /// Does nothing until both edges exist. If the walk cannot reach `last`
    /// it stops, keeping the `child` edges added so far.
    pub fn connect_span_container_parents(&mut self, id: &str) {
        let first = self.targets_of_type(id, EdgeType::FIRST).into_iter().next();
        let last = self.targets_of_type(id, EdgeType::LAST).into_iter().next();
        let (Some(first), Some(last)) = (first, last) else {
            return;
        };

        let mut visited = FxHashSet::default();
        let mut current = first;
        loop {
            if !visited.insert(current.clone()) {
                warn!(container = id, node = %current, "sequence cycle inside span container");
                return;
            }
            if !self.edge_exists(id, &current, EdgeType::CHILD) {
                self.add_edge(id, &current, EdgeType::child(), None);
            }
            if current == last {
                return;
            }
            match self.successor(&current) {
                Some(next) => current = next,
                None => {
                    debug!(
                        container = id,
                        stopped_at = %current,
                        last = %last,
                        "span container chain does not reach its last member"
                    );
                    return;
                }
            }
        }
    }

    /// Bridge the gap around a node: `P -> node -> S` becomes `P -> S`
    ///
    /// Only acts when both a predecessor and a successor exist. Returns
    /// whether the chain was repaired.
    pub fn disconnect(&mut self, id: &str) -> bool {
        let (Some(predecessor), Some(successor)) = (self.predecessor(id), self.successor(id)) else {
            return false;
        };

        debug!(
            node = id,
            predecessor = %predecessor,
            successor = %successor,
            "removing node from sequence"
        );
        self.remove_edge(id, &successor, EdgeType::NEXT);
        self.remove_edge(&predecessor, id, EdgeType::NEXT);
        if predecessor != successor {
            self.add_edge(&predecessor, &successor, EdgeType::next(), None);
        }
        true
    }

    /// Disconnect a sequence node, then drop all its outgoing edges
    pub(crate) fn remove_node_edges(&mut self, id: &str) {
        if self.node_has_trait(id, Trait::Sequence) {
            self.disconnect(id);
        }
        self.clear_outgoing(id);
    }

    /// Remove one outgoing edge; removing a sequence node's `next` edge
    /// while it has a predecessor splices the node out instead of cutting
    /// the chain in two
    pub(crate) fn remove_node_edge(&mut self, id: &str, edge: &Edge) {
        let splices = edge.is_type(EdgeType::NEXT)
            && self.node_has_trait(id, Trait::Sequence)
            && self.predecessor(id).is_some()
            && self.successor(id).is_some_and(|successor| edge.ends_at(&successor));
        if splices {
            self.disconnect(id);
        } else {
            self.remove_edge(id, &edge.target, edge.edge_type.as_str());
        }
    }
}
