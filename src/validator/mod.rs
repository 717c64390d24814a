//! Schema validation of graph nodes
//!
//! Validation never stops at the first problem: every issue found on a node
//! is collected so a caller can report them all at once.

mod edge;
mod property;

use crate::graph::{Graph, NodeId, NodeType};
use crate::schema::{Arity, Schema};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// What is wrong with a node
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationErrorKind {
    #[error("Node with id {0} does not exist")]
    NodeMissing(NodeId),

    #[error("{node_type} is not defined in {schema}")]
    UndefinedNodeType { node_type: NodeType, schema: String },

    #[error(
        "Arity of {name} property is out of range. Arity min: {min} Arity max: {max} Arity Actual: {actual}"
    )]
    PropertyArity {
        name: String,
        min: u32,
        max: Arity,
        actual: usize,
    },

    #[error("{0} is a required property")]
    RequiredProperty(String),

    #[error("{0} must be an integer")]
    NotInteger(String),

    #[error("{0} must be a float")]
    NotFloat(String),

    #[error("{name} must be within {min} and {max}")]
    OutOfRange { name: String, min: f64, max: f64 },

    #[error("{value} is not a valid value for property {name}")]
    NotEnumerated { name: String, value: String },

    #[error("{0} must be a boolean")]
    NotBoolean(String),

    #[error("{0} must be a string")]
    NotString(String),

    #[error(
        "Arity of {name} edge is out of range. Arity min: {min} Arity max: {max} Arity Actual: {actual}"
    )]
    EdgeArity {
        name: String,
        min: u32,
        max: Arity,
        actual: usize,
    },

    #[error("{0} is a required edge")]
    RequiredEdge(String),

    #[error("{name} edge to node {target} of type {target_type} is not allowed")]
    EdgeTargetNotAllowed {
        name: String,
        target: NodeId,
        target_type: NodeType,
    },
}

/// A single validation failure, tagged with the node it was found on
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub node_id: NodeId,
    pub node_type: Option<NodeType>,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_type {
            Some(node_type) => write!(f, "[{} {}] {}", node_type, self.node_id, self.kind),
            None => write!(f, "[{}] {}", self.node_id, self.kind),
        }
    }
}

/// Result of validating a whole graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate one node's properties and edges against its type's spec
pub fn validate_node(graph: &Graph, schema: &Schema, id: &str) -> Vec<ValidationIssue> {
    let Some(node) = graph.get_node_by_id(id) else {
        return vec![ValidationIssue {
            node_id: NodeId::new(id),
            node_type: None,
            kind: ValidationErrorKind::NodeMissing(NodeId::new(id)),
        }];
    };

    let issue = |kind| ValidationIssue {
        node_id: node.id().clone(),
        node_type: Some(node.node_type().clone()),
        kind,
    };

    let Some(spec) = schema.node_type(node.node_type()) else {
        return vec![issue(ValidationErrorKind::UndefinedNodeType {
            node_type: node.node_type().clone(),
            schema: schema.id.clone(),
        })];
    };

    let mut kinds = property::validate_properties(node, spec);
    kinds.extend(edge::validate_edges(graph, node, spec));
    kinds.into_iter().map(issue).collect()
}

/// Validate every node, in insertion order
pub fn validate_graph(graph: &Graph, schema: &Schema) -> ValidationReport {
    let issues: Vec<ValidationIssue> = graph
        .get_node_ids()
        .iter()
        .flat_map(|id| validate_node(graph, schema, id))
        .collect();
    debug!(schema = %schema.id, nodes = graph.node_count(), issues = issues.len(), "validated graph");
    ValidationReport { issues }
}

/// Arity check shared by properties and edges
fn arity_in_range(count: usize, min: u32, max: Arity) -> bool {
    count >= min as usize && max.allows(count)
}
