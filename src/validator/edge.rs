//! Edge checks

use super::{arity_in_range, ValidationErrorKind};
use crate::graph::{Graph, Node};
use crate::schema::NodeTypeSpec;

pub(super) fn validate_edges(graph: &Graph, node: &Node, spec: &NodeTypeSpec) -> Vec<ValidationErrorKind> {
    let mut errors = Vec::new();
    let Some(view) = graph.node(node.id()) else {
        return errors;
    };

    for edge_spec in spec.edge_specs.values() {
        let edges = view.edges_by_type(&edge_spec.name);
        if edges.is_empty() {
            if edge_spec.is_required() {
                errors.push(ValidationErrorKind::RequiredEdge(edge_spec.name.clone()));
            }
            continue;
        }

        if !arity_in_range(edges.len(), edge_spec.min_arity, edge_spec.max_arity) {
            errors.push(ValidationErrorKind::EdgeArity {
                name: edge_spec.name.clone(),
                min: edge_spec.min_arity,
                max: edge_spec.max_arity,
                actual: edges.len(),
            });
        }

        for edge in edges {
            if !edge_spec.allows_target(&edge.target_type) {
                errors.push(ValidationErrorKind::EdgeTargetNotAllowed {
                    name: edge_spec.name.clone(),
                    target: edge.target.clone(),
                    target_type: edge.target_type.clone(),
                });
            }
        }
    }

    errors
}
