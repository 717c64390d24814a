//! In-memory annotation graph
//!
//! The graph owns every attached node in an id-keyed arena and stores edges
//! in per-node adjacency maps:
//! - nodes: NodeId -> Node (insertion ordered)
//! - type_buckets: NodeType -> [NodeId]
//! - outgoing: NodeId -> (target, edge type) -> Edge
//! - incoming: NodeId -> {(source, edge type)}
//!
//! Edges reference node ids, never node handles, so there is no shared
//! ownership between nodes and the graph.

use super::config::GraphConfig;
use super::edge::Edge;
use super::node::{Node, NodeMut, NodeRef};
use super::traits::{
    SequenceAttrs, SpanAttrs, SpanContainerAttrs, Trait, TraitRegistry, TraitSet,
};
use super::types::{EdgeType, NodeId, NodeType};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised for caller-contract violations
///
/// Malformed document data (dangling edge endpoints, broken chains) never
/// produces one of these; it is logged and skipped instead.
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node `{0}` not found")]
    NodeNotFound(NodeId),

    #[error("Graph already contains a node with id `{0}`")]
    NodeAlreadyExists(NodeId),

    #[error("A node added to the graph must have a type")]
    MissingNodeType,

    #[error("Calling `{operation}` on node `{node}` that does not have the `{required}` trait")]
    MissingTrait {
        node: NodeId,
        operation: &'static str,
        required: &'static str,
    },

    #[error("Node type `{0}` is not defined in the graph")]
    UnknownNodeType(NodeType),

    #[error("Node `{node}` is not the source of the edge (source is `{source_id}`)")]
    NotEdgeSource { node: NodeId, source_id: NodeId },

    #[error("Unknown node property type `{0}`")]
    UnknownValueKind(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

static NEXT_GRAPH_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle of a graph instance
///
/// Nodes record the handle of the graph they are attached to instead of a
/// reference, so a node can never keep its graph alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    fn next() -> Self {
        GraphId(NEXT_GRAPH_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphId({})", self.0)
    }
}

type EdgeKey = (NodeId, EdgeType);

/// Annotation graph over a single content string
#[derive(Debug)]
pub struct Graph {
    handle: GraphId,

    /// Document id
    id: Option<String>,

    config: GraphConfig,

    schema_uris: Vec<String>,

    content: Option<String>,

    content_type: Option<String>,

    /// Trait memberships per node type
    traits: TraitRegistry,

    /// Node arena, keyed by id
    nodes: IndexMap<NodeId, Node>,

    /// Node type buckets
    type_buckets: IndexMap<NodeType, Vec<NodeId>>,

    /// Outgoing edges for each node, keyed by (target, edge type)
    outgoing: FxHashMap<NodeId, IndexMap<EdgeKey, Edge>>,

    /// Incoming edge keys for each node, as (source, edge type)
    incoming: FxHashMap<NodeId, IndexSet<EdgeKey>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Graph {
            handle: GraphId::next(),
            id: None,
            config,
            schema_uris: Vec::new(),
            content: None,
            content_type: None,
            traits: TraitRegistry::new(),
            nodes: IndexMap::new(),
            type_buckets: IndexMap::new(),
            outgoing: FxHashMap::default(),
            incoming: FxHashMap::default(),
        }
    }

    pub fn handle(&self) -> GraphId {
        self.handle
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn add_schema_uri(&mut self, uri: impl Into<String>) {
        self.schema_uris.push(uri.into());
    }

    pub fn schema_uris(&self) -> Vec<String> {
        self.schema_uris.clone()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    // Trait registration

    pub fn set_node_type_as_span(&mut self, node_type: impl Into<NodeType>) {
        self.traits.set_span(node_type.into(), SpanAttrs::default());
    }

    pub fn set_node_type_as_sequence(&mut self, node_type: impl Into<NodeType>, attrs: SequenceAttrs) {
        self.traits.set_sequence(node_type.into(), attrs);
    }

    pub fn set_node_type_as_span_container(
        &mut self,
        node_type: impl Into<NodeType>,
        attrs: SpanContainerAttrs,
    ) {
        self.traits.set_span_container(node_type.into(), attrs);
    }

    /// Copy of the span registry
    pub fn node_types_as_span(&self) -> IndexMap<NodeType, SpanAttrs> {
        self.traits.span_types().clone()
    }

    /// Copy of the sequence registry
    pub fn node_types_as_sequence(&self) -> IndexMap<NodeType, SequenceAttrs> {
        self.traits.sequence_types().clone()
    }

    /// Copy of the span container registry
    pub fn node_types_as_span_container(&self) -> IndexMap<NodeType, SpanContainerAttrs> {
        self.traits.span_container_types().clone()
    }

    pub fn traits_of(&self, node_type: &NodeType) -> TraitSet {
        self.traits.traits_of(node_type)
    }

    pub(crate) fn node_has_trait(&self, id: &str, t: Trait) -> bool {
        self.nodes
            .get(id)
            .map_or(false, |node| self.traits.has(node.node_type(), t))
    }

    // Node manipulation

    /// Create a node of `node_type` and add it without linking
    ///
    /// An id is generated when `id` is `None`.
    pub fn create_node(
        &mut self,
        node_type: impl Into<NodeType>,
        id: Option<NodeId>,
    ) -> GraphResult<NodeId> {
        let node_type = node_type.into();
        if node_type.is_empty() {
            return Err(GraphError::MissingNodeType);
        }
        let node = match id {
            Some(id) => Node::with_id(id, node_type),
            None => Node::new(node_type),
        };
        self.insert_node(node, false)
    }

    /// Add a detached node, linking it into its sequences and containers
    /// unless linking on add is disabled in the config
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let link = self.config.link_on_add;
        self.insert_node(node, link)
    }

    /// Add a detached node without running the link procedure (bulk loads)
    pub fn add_node_unlinked(&mut self, node: Node) -> GraphResult<NodeId> {
        self.insert_node(node, false)
    }

    fn insert_node(&mut self, mut node: Node, link: bool) -> GraphResult<NodeId> {
        if node.node_type().is_empty() {
            return Err(GraphError::MissingNodeType);
        }
        if self.nodes.contains_key(node.id().as_str()) {
            return Err(GraphError::NodeAlreadyExists(node.id().clone()));
        }
        if node.id().is_unset() {
            node.set_id(self.generate_node_id());
        }

        let id = node.id().clone();
        node.attach(self.handle);

        self.type_buckets
            .entry(node.node_type().clone())
            .or_default()
            .push(id.clone());
        self.nodes.insert(id.clone(), node);

        if link {
            self.link_node(&id);
        }
        Ok(id)
    }

    /// Remove a node, repairing the sequence around it first
    ///
    /// All edges touching the node are removed with it. The detached node is
    /// returned to the caller.
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Node> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(NodeId::new(id)));
        }

        self.remove_node_edges(id);

        let Some(mut node) = self.nodes.shift_remove(id) else {
            return Err(GraphError::NodeNotFound(NodeId::new(id)));
        };

        if let Some(bucket) = self.type_buckets.get_mut(node.node_type()) {
            bucket.retain(|member| member.as_str() != id);
            if bucket.is_empty() {
                self.type_buckets.shift_remove(node.node_type());
            }
        }

        // Drop edges still pointing at the node
        if let Some(keys) = self.incoming.remove(id) {
            for (source, edge_type) in keys {
                if let Some(edges) = self.outgoing.get_mut(&source) {
                    edges.shift_remove(&(node.id().clone(), edge_type));
                }
            }
        }
        self.outgoing.remove(id);

        node.detach();
        debug!(node = %id, node_type = %node.node_type(), "removed node");
        Ok(node)
    }

    /// Change a node's type, keeping the type buckets in sync
    ///
    /// Edges already pointing at the node keep their target type snapshot.
    pub fn set_node_type(&mut self, id: &str, node_type: impl Into<NodeType>) -> GraphResult<()> {
        let node_type = node_type.into();
        if node_type.is_empty() {
            return Err(GraphError::MissingNodeType);
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::new(id)))?;
        let old_type = node.node_type().clone();
        node.set_type(node_type.clone());

        if let Some(bucket) = self.type_buckets.get_mut(&old_type) {
            bucket.retain(|member| member.as_str() != id);
            if bucket.is_empty() {
                self.type_buckets.shift_remove(&old_type);
            }
        }
        self.type_buckets
            .entry(node_type)
            .or_default()
            .push(NodeId::new(id));
        Ok(())
    }

    pub fn node_exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Read view of an attached node
    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|node| NodeRef::new(self, node))
    }

    /// Mutation view of an attached node
    pub fn node_mut(&mut self, id: &str) -> Option<NodeMut<'_>> {
        let id = self.nodes.get_key_value(id)?.0.clone();
        Some(NodeMut::new(self, id))
    }

    pub(crate) fn node_entry_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Node ids in insertion order
    pub fn get_node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes of a type, in insertion order; empty for unknown types
    pub fn get_nodes_by_type(&self, node_type: &str) -> Vec<&Node> {
        self.type_buckets
            .get(node_type)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Types that currently have at least one node
    pub fn get_node_types(&self) -> Vec<NodeType> {
        self.type_buckets.keys().cloned().collect()
    }

    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.type_buckets.contains_key(node_type)
    }

    /// Next free id: one past the largest numeric id in the graph
    ///
    /// When that would overflow, the smallest unused positive id is taken.
    fn generate_node_id(&self) -> NodeId {
        let current_max = self
            .nodes
            .keys()
            .map(NodeId::numeric_value)
            .fold(0, i64::max);
        if let Some(next) = current_max.checked_add(1) {
            return NodeId::from(next.to_string());
        }

        warn!(current_max, "numeric node ids exhausted, reusing a free id");
        (1..=i64::MAX)
            .map(|candidate| candidate.to_string())
            .find(|candidate| !self.nodes.contains_key(candidate.as_str()))
            .map(NodeId::from)
            .unwrap_or_default()
    }

    // Edge manipulation

    /// Add or overwrite the `(source, target, edge_type)` edge
    ///
    /// Missing endpoints are document noise, not a caller error: a diagnostic
    /// is logged and no edge is created. Returns whether the edge was stored.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        edge_type: impl Into<EdgeType>,
        target_type: Option<NodeType>,
    ) -> bool {
        let edge_type = edge_type.into();
        let source_exists = self.nodes.contains_key(source);
        let Some(target_node) = self.nodes.get(target) else {
            if source_exists {
                warn!(
                    source,
                    target,
                    edge_type = %edge_type,
                    "Cannot create `{}` edge from node id `{}` to non-existent node id `{}`.",
                    edge_type, source, target
                );
            } else {
                warn!(
                    source,
                    target,
                    edge_type = %edge_type,
                    "Cannot create `{}` edge between non-existent node ids `{}` and `{}`.",
                    edge_type, source, target
                );
            }
            return false;
        };
        if !source_exists {
            warn!(
                source,
                target,
                edge_type = %edge_type,
                "Cannot create `{}` edge from non-existent node id `{}` to node id `{}`.",
                edge_type, source, target
            );
            return false;
        }

        let target_type = target_type.unwrap_or_else(|| target_node.node_type().clone());
        let source_id = NodeId::new(source);
        let target_id = NodeId::new(target);
        let edge = Edge::new(source_id.clone(), target_id.clone(), target_type, edge_type.clone());

        self.outgoing
            .entry(source_id.clone())
            .or_default()
            .insert((target_id.clone(), edge_type.clone()), edge);
        self.incoming
            .entry(target_id)
            .or_default()
            .insert((source_id, edge_type));
        true
    }

    /// Import edges as-is, keeping their target type snapshots
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        for edge in edges {
            self.add_edge(
                &edge.source,
                &edge.target,
                edge.edge_type,
                Some(edge.target_type),
            );
        }
    }

    /// Remove the `(source, target, edge_type)` edge; a no-op when absent
    pub fn remove_edge(&mut self, source: &str, target: &str, edge_type: &str) -> Option<Edge> {
        let key = (NodeId::new(target), EdgeType::new(edge_type));
        let removed = self.outgoing.get_mut(source)?.shift_remove(&key);
        if removed.is_some() {
            if let Some(keys) = self.incoming.get_mut(target) {
                keys.shift_remove(&(NodeId::new(source), EdgeType::new(edge_type)));
            }
        }
        removed
    }

    pub fn get_edge(&self, source: &str, target: &str, edge_type: &str) -> Option<&Edge> {
        self.outgoing
            .get(source)?
            .get(&(NodeId::new(target), EdgeType::new(edge_type)))
    }

    pub fn edge_exists(&self, source: &str, target: &str, edge_type: &str) -> bool {
        self.get_edge(source, target, edge_type).is_some()
    }

    /// All edges leaving a node, internal tracking edges included
    pub fn out_edges(&self, id: &str) -> Vec<&Edge> {
        self.outgoing
            .get(id)
            .map(|edges| edges.values().collect())
            .unwrap_or_default()
    }

    /// All edges entering a node, internal tracking edges included
    pub fn in_edges(&self, id: &str) -> Vec<&Edge> {
        self.incoming
            .get(id)
            .map(|keys| {
                keys.iter()
                    .filter_map(|(source, edge_type)| {
                        self.outgoing
                            .get(source)?
                            .get(&(NodeId::new(id), edge_type.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(IndexMap::len).sum()
    }

    /// Targets of a node's outgoing edges of one type, in insertion order
    pub(crate) fn targets_of_type(&self, id: &str, edge_type: &str) -> Vec<NodeId> {
        self.outgoing
            .get(id)
            .map(|edges| {
                edges
                    .values()
                    .filter(|edge| edge.is_type(edge_type))
                    .map(|edge| edge.target.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sources of a node's incoming edges of one type, in insertion order
    pub(crate) fn sources_of_type(&self, id: &str, edge_type: &str) -> Vec<NodeId> {
        self.incoming
            .get(id)
            .map(|keys| {
                keys.iter()
                    .filter(|(_, et)| et.is(edge_type))
                    .map(|(source, _)| source.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every outgoing edge of a node, internal ones included
    pub(crate) fn clear_outgoing(&mut self, id: &str) {
        let Some(edges) = self.outgoing.remove(id) else {
            return;
        };
        for ((target, edge_type), _) in edges {
            if let Some(keys) = self.incoming.get_mut(&target) {
                keys.shift_remove(&(NodeId::new(id), edge_type));
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
