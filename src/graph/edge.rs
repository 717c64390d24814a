//! Edge value for the annotation multigraph
//!
//! Edges are immutable. Between one source and target at most one edge of a
//! given [`EdgeType`] exists; different edge types coexist.

use super::types::{EdgeType, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// A directed, typed edge
///
/// `target_type` is a snapshot of the target's type taken when the edge was
/// created. It is not refreshed if the target's type changes later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    /// Type of the target node at creation time
    pub target_type: NodeType,

    /// Type of relationship (e.g. "next", "first", "dependency")
    pub edge_type: EdgeType,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        target_type: impl Into<NodeType>,
        edge_type: impl Into<EdgeType>,
    ) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            target_type: target_type.into(),
            edge_type: edge_type.into(),
        }
    }

    /// Check if this edge goes FROM a specific node
    pub fn starts_from(&self, node: &NodeId) -> bool {
        &self.source == node
    }

    /// Check if this edge goes TO a specific node
    pub fn ends_at(&self, node: &NodeId) -> bool {
        &self.target == node
    }

    pub fn is_type(&self, edge_type: &str) -> bool {
        self.edge_type.is(edge_type)
    }
}
