//! Node-type traits
//!
//! A trait is a capability registered per node type (not per node): `span`
//! nodes carry a character range, `sequence` nodes form a `next`-linked chain,
//! and `spanContainer` nodes cover a sub-range of a chain through `first` and
//! `last` edges.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::NodeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Span,
    Sequence,
    SpanContainer,
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trait::Span => f.write_str("span"),
            Trait::Sequence => f.write_str("sequence"),
            Trait::SpanContainer => f.write_str("spanContainer"),
        }
    }
}

/// The traits carried by one node type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraitSet {
    pub span: bool,
    pub sequence: bool,
    pub span_container: bool,
}

impl TraitSet {
    pub fn contains(&self, t: Trait) -> bool {
        match t {
            Trait::Span => self.span,
            Trait::Sequence => self.sequence,
            Trait::SpanContainer => self.span_container,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.span || self.sequence || self.span_container)
    }
}

/// Attributes of the `span` trait (none beyond membership)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanAttrs {}

/// Attributes of the `sequence` trait
///
/// `contiguous` is metadata only; the graph does not enforce it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceAttrs {
    #[serde(default)]
    pub contiguous: bool,
}

/// Attributes of the `spanContainer` trait
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContainerAttrs {
    /// Node type of the sequence members this container covers
    #[serde(default, rename = "spanType")]
    pub span_type: Option<NodeType>,
}

/// Per-graph registry of trait memberships
#[derive(Debug, Clone, Default)]
pub struct TraitRegistry {
    span: IndexMap<NodeType, SpanAttrs>,
    sequence: IndexMap<NodeType, SequenceAttrs>,
    span_container: IndexMap<NodeType, SpanContainerAttrs>,
}

impl TraitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_span(&mut self, node_type: NodeType, attrs: SpanAttrs) {
        self.span.insert(node_type, attrs);
    }

    pub fn set_sequence(&mut self, node_type: NodeType, attrs: SequenceAttrs) {
        self.sequence.insert(node_type, attrs);
    }

    pub fn set_span_container(&mut self, node_type: NodeType, attrs: SpanContainerAttrs) {
        self.span_container.insert(node_type, attrs);
    }

    pub fn span_types(&self) -> &IndexMap<NodeType, SpanAttrs> {
        &self.span
    }

    pub fn sequence_types(&self) -> &IndexMap<NodeType, SequenceAttrs> {
        &self.sequence
    }

    pub fn span_container_types(&self) -> &IndexMap<NodeType, SpanContainerAttrs> {
        &self.span_container
    }

    pub fn has(&self, node_type: &NodeType, t: Trait) -> bool {
        match t {
            Trait::Span => self.span.contains_key(node_type),
            Trait::Sequence => self.sequence.contains_key(node_type),
            Trait::SpanContainer => self.span_container.contains_key(node_type),
        }
    }

    pub fn traits_of(&self, node_type: &NodeType) -> TraitSet {
        TraitSet {
            span: self.span.contains_key(node_type),
            sequence: self.sequence.contains_key(node_type),
            span_container: self.span_container.contains_key(node_type),
        }
    }
}
