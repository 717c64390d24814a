//! Annotation graph data model
//!
//! This module implements the document graph with:
//! - Typed nodes with multi-valued, typed properties
//! - Directed edges keyed by (source, target, edge type)
//! - Per-type traits (span, sequence, spanContainer)
//! - A link engine keeping sequence chains and container shadow edges consistent
//! - Index computation and ancestor search over the repaired edge set

pub mod config;
pub mod edge;
pub mod index;
pub mod link;
pub mod node;
pub mod property;
pub mod store;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::{GraphConfig, DEFAULT_GRAPH_VERSION};
pub use edge::Edge;
pub use index::UNRESOLVED_INDEX;
pub use node::{Node, NodeMut, NodeRef};
pub use property::{Property, PropertyMap, PropertyValue, ValueKind};
pub use store::{Graph, GraphError, GraphId, GraphResult};
pub use traits::{SequenceAttrs, SpanAttrs, SpanContainerAttrs, Trait, TraitRegistry, TraitSet};
pub use types::{EdgeType, NodeId, NodeType};
