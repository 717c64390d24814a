//! Pagis Annotation Graph
//!
//! A typed, directed multigraph of annotations over a single text blob:
//! tokens, sentences, and the containers that group them.
//!
//! # Architecture
//!
//! - [`graph`]: nodes, edges, traits, the link engine that keeps sequence
//!   chains and container shadow edges consistent, index computation and
//!   ancestor search
//! - [`schema`]: schema types, parent resolution and trait registration
//! - [`validator`]: property and edge validation against a schema
//!
//! Malformed documents are tolerated: dangling edges and broken chains are
//! logged through `tracing` and skipped. Caller mistakes, such as asking a
//! node for a trait it does not have, return a [`GraphError`].
//!
//! ## Example Usage
//!
//! ```rust
//! use pagis::graph::{EdgeType, Graph, SequenceAttrs, ValueKind};
//!
//! let mut graph = Graph::new();
//! graph.set_content("Mary had a lamb");
//! graph.set_node_type_as_span("TOK");
//! graph.set_node_type_as_sequence("TOK", SequenceAttrs::default());
//!
//! let mary = graph.create_node("TOK", None).unwrap();
//! let had = graph.create_node("TOK", None).unwrap();
//! for (id, start, length) in [(&mary, "0", "4"), (&had, "5", "3")] {
//!     let mut node = graph.node_mut(id).unwrap();
//!     node.add_prop(ValueKind::Integer, "start", Some(start));
//!     node.add_prop(ValueKind::Integer, "length", Some(length));
//! }
//! graph.node_mut(&mary).unwrap().add_edge(&had, EdgeType::NEXT, None);
//!
//! let node = graph.node(&mary).unwrap();
//! let next = node.next().unwrap().unwrap();
//! assert_eq!(next.text().unwrap(), "had");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod schema;
pub mod validator;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeType, Graph, GraphConfig, GraphError, GraphResult, Node, NodeId, NodeMut, NodeRef,
    NodeType, PropertyMap, PropertyValue, ValueKind,
};

pub use schema::{
    Arity, EdgeSpec, MemoryLocator, NodeTraits, NodeTypeSpec, PropertySpec, Restrictions, Schema,
    SchemaDocument, SchemaError, SchemaLocator, SchemaResult,
};

pub use validator::{
    validate_graph, validate_node, ValidationErrorKind, ValidationIssue, ValidationReport,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "1.0.0");
    }
}
