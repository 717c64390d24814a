//! Node implementation for the annotation graph
//!
//! A [`Node`] is a plain value: id, type and multi-valued properties. It does
//! not hold its edges or its graph. Once attached, a node is reached through
//! a [`NodeRef`] (reads, trait queries, navigation) or a [`NodeMut`] (edits
//! that may trigger the link engine), both borrowed from the [`Graph`].

use super::edge::Edge;
use super::property::{Property, PropertyMap, PropertyValue, ValueKind};
use super::store::{Graph, GraphError, GraphId, GraphResult};
use super::traits::{Trait, TraitSet};
use super::types::{EdgeType, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use tracing::warn;

/// A node in the annotation graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier; unset until the node is added to a graph
    id: NodeId,

    node_type: NodeType,

    /// Properties in insertion order
    properties: PropertyMap,

    /// Handle of the owning graph while attached
    #[serde(skip)]
    graph: Option<GraphId>,
}

impl Node {
    /// Create a detached node whose id will be generated on insertion
    pub fn new(node_type: impl Into<NodeType>) -> Self {
        Self::with_id(NodeId::default(), node_type)
    }

    /// Create a detached node with an explicit id
    pub fn with_id(id: impl Into<NodeId>, node_type: impl Into<NodeType>) -> Self {
        Node {
            id: id.into(),
            node_type: node_type.into(),
            properties: PropertyMap::new(),
            graph: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<NodeId>) {
        self.id = id.into();
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Set the type of a detached node. Attached nodes change type through
    /// [`Graph::set_node_type`].
    pub fn set_type(&mut self, node_type: impl Into<NodeType>) {
        self.node_type = node_type.into();
    }

    /// Handle of the graph this node is attached to
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    pub(crate) fn attach(&mut self, graph: GraphId) {
        self.graph = Some(graph);
    }

    pub(crate) fn detach(&mut self) {
        self.graph = None;
    }

    /// Append a value under `key`, coerced to `kind`
    ///
    /// `None` records the key with an empty value list, replacing whatever
    /// was recorded before. Values appended to an existing key are coerced to
    /// the kind the key was first declared with.
    pub fn add_prop(&mut self, kind: ValueKind, key: impl Into<String>, value: Option<&str>) {
        let key = key.into();
        let Some(raw) = value else {
            self.properties.insert(key, Property::new(kind));
            return;
        };

        let property = self
            .properties
            .entry(key)
            .or_insert_with(|| Property::new(kind));
        if property.kind != kind {
            warn!(
                node = %self.id,
                declared = %property.kind,
                requested = %kind,
                "property value kind does not match the key's declared kind"
            );
        }
        let parsed = property.kind.parse(raw);
        property.values.push(parsed);
    }

    /// Values recorded under `key`; empty when the key is absent
    pub fn get_prop(&self, key: &str) -> &[PropertyValue] {
        self.properties
            .get(key)
            .map(|p| p.values.as_slice())
            .unwrap_or(&[])
    }

    /// First value under `key`, for properties with a max arity of one
    pub fn get_first_prop(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key).and_then(|p| p.values.first())
    }

    /// Copy of the whole property map
    pub fn get_props(&self) -> PropertyMap {
        self.properties.clone()
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

/// Read view of a node attached to a graph
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    node: &'g Node,
}

impl<'g> NodeRef<'g> {
    pub(crate) fn new(graph: &'g Graph, node: &'g Node) -> Self {
        NodeRef { graph, node }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn node(&self) -> &'g Node {
        self.node
    }

    fn wrap(&self, id: &str) -> Option<NodeRef<'g>> {
        self.graph.node(id)
    }

    /// Outgoing edges, internal tracking edges excluded
    pub fn edges(&self) -> Vec<&'g Edge> {
        self.graph
            .out_edges(self.node.id())
            .into_iter()
            .filter(|edge| !edge.edge_type.is_internal())
            .collect()
    }

    pub fn edges_by_type(&self, edge_type: &str) -> Vec<&'g Edge> {
        self.edges()
            .into_iter()
            .filter(|edge| edge.is_type(edge_type))
            .collect()
    }

    pub fn first_edge_by_type(&self, edge_type: &str) -> Option<&'g Edge> {
        self.edges().into_iter().find(|edge| edge.is_type(edge_type))
    }

    pub fn traits(&self) -> TraitSet {
        self.graph.traits_of(self.node.node_type())
    }

    pub fn has_trait_span(&self) -> bool {
        self.traits().span
    }

    pub fn has_trait_sequence(&self) -> bool {
        self.traits().sequence
    }

    pub fn has_trait_span_container(&self) -> bool {
        self.traits().span_container
    }

    fn require(&self, t: Trait, operation: &'static str, required: &'static str) -> GraphResult<()> {
        if self.traits().contains(t) {
            Ok(())
        } else {
            Err(GraphError::MissingTrait {
                node: self.node.id().clone(),
                operation,
                required,
            })
        }
    }

    /// Covered text of a span or span container
    pub fn text(&self) -> GraphResult<String> {
        self.graph.text(self.node.id())
    }

    /// Inclusive start offset, or -1 when it cannot be derived
    pub fn start_index(&self) -> i64 {
        self.graph.start_index(self.node.id())
    }

    /// Exclusive end offset, or -1 when it cannot be derived
    pub fn end_index(&self) -> i64 {
        self.graph.end_index(self.node.id())
    }

    // Sequence trait

    pub fn has_next(&self) -> bool {
        self.has_trait_sequence() && self.first_edge_by_type(EdgeType::NEXT).is_some()
    }

    pub fn next(&self) -> GraphResult<Option<NodeRef<'g>>> {
        self.require(Trait::Sequence, "next", "sequence")?;
        Ok(self
            .first_edge_by_type(EdgeType::NEXT)
            .and_then(|edge| self.wrap(&edge.target)))
    }

    /// True when some node has a `next` edge to this one
    pub fn has_previous(&self) -> bool {
        self.has_trait_sequence()
            && !self
                .graph
                .sources_of_type(self.node.id(), EdgeType::NEXT)
                .is_empty()
    }

    /// The node whose `next` edge points here
    ///
    /// There is no stored `previous` edge; incoming `next` edges are scanned.
    /// Unless exactly one predecessor exists the result is `None`.
    pub fn previous(&self) -> GraphResult<Option<NodeRef<'g>>> {
        self.previous_excluding(&[])
    }

    /// Like [`NodeRef::previous`], ignoring candidates listed in `exclude`
    ///
    /// Lets a caller repairing a broken chain narrow several predecessors
    /// down to one.
    pub fn previous_excluding(&self, exclude: &[NodeId]) -> GraphResult<Option<NodeRef<'g>>> {
        self.require(Trait::Sequence, "previous", "sequence")?;
        let candidates: Vec<NodeId> = self
            .graph
            .sources_of_type(self.node.id(), EdgeType::NEXT)
            .into_iter()
            .filter(|source| !exclude.contains(source))
            .collect();
        match candidates.as_slice() {
            [single] => Ok(self.wrap(single)),
            [] => Ok(None),
            _ => {
                warn!(
                    node = %self.node.id(),
                    predecessors = candidates.len(),
                    "sequence node has more than one predecessor"
                );
                Ok(None)
            }
        }
    }

    // SpanContainer trait

    pub fn first(&self) -> GraphResult<Option<NodeRef<'g>>> {
        self.require(Trait::SpanContainer, "first", "spanContainer")?;
        Ok(self
            .first_edge_by_type(EdgeType::FIRST)
            .and_then(|edge| self.wrap(&edge.target)))
    }

    pub fn last(&self) -> GraphResult<Option<NodeRef<'g>>> {
        self.require(Trait::SpanContainer, "last", "spanContainer")?;
        Ok(self
            .first_edge_by_type(EdgeType::LAST)
            .and_then(|edge| self.wrap(&edge.target)))
    }

    // Ancestors

    /// Nearest container ancestor of `node_type`, depth first
    pub fn first_parent_of_type(&self, node_type: &str) -> GraphResult<Option<NodeRef<'g>>> {
        let found = self.graph.first_parent_of_type(self.node.id(), node_type)?;
        Ok(found.map(|node| NodeRef::new(self.graph, node)))
    }

    /// Every container ancestor of `node_type`, in depth-first visit order
    pub fn parents_of_type(&self, node_type: &str) -> GraphResult<Vec<NodeRef<'g>>> {
        let found = self.graph.parents_of_type(self.node.id(), node_type)?;
        Ok(found
            .into_iter()
            .map(|node| NodeRef::new(self.graph, node))
            .collect())
    }
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.node.id() == other.node.id()
    }
}

/// Mutation view of a node attached to a graph
#[derive(Debug)]
pub struct NodeMut<'g> {
    graph: &'g mut Graph,
    id: NodeId,
}

impl<'g> NodeMut<'g> {
    pub(crate) fn new(graph: &'g mut Graph, id: NodeId) -> Self {
        NodeMut { graph, id }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Read view of the same node
    pub fn view(&self) -> Option<NodeRef<'_>> {
        self.graph.node(&self.id)
    }

    pub fn add_prop(&mut self, kind: ValueKind, key: impl Into<String>, value: Option<&str>) {
        if let Some(node) = self.graph.node_entry_mut(&self.id) {
            node.add_prop(kind, key, value);
        }
    }

    /// Change the node's type, keeping the graph's type buckets in sync
    pub fn set_type(&mut self, node_type: impl Into<NodeType>) -> GraphResult<()> {
        self.graph.set_node_type(&self.id, node_type)
    }

    /// Add an outgoing edge, then re-link this node
    ///
    /// The new edge may have turned this node into a mid-chain insertion or
    /// completed a container's `first`/`last` pair. Re-linking is skipped when
    /// `GraphConfig::link_on_add` is off. Returns whether the edge was stored.
    pub fn add_edge(
        &mut self,
        target: &str,
        edge_type: impl Into<EdgeType>,
        target_type: Option<NodeType>,
    ) -> bool {
        let added = self.graph.add_edge(&self.id, target, edge_type, target_type);
        if self.graph.config().link_on_add {
            self.graph.link_node(&self.id);
        }
        added
    }

    /// Remove one of this node's outgoing edges
    pub fn remove_edge(&mut self, edge: &Edge) -> GraphResult<()> {
        if !edge.starts_from(&self.id) {
            return Err(GraphError::NotEdgeSource {
                node: self.id.clone(),
                source_id: edge.source.clone(),
            });
        }
        self.graph.remove_node_edge(&self.id, edge);
        Ok(())
    }

    /// Splice this node out of its sequence, then drop every outgoing edge
    pub fn remove_edges(&mut self) {
        self.graph.remove_node_edges(&self.id);
    }
}
