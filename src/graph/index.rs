//! Index computation and ancestor search
//!
//! Start offsets are inclusive and end offsets exclusive. An offset that
//! cannot be derived from the current edges is reported as `-1`.

use super::node::Node;
use super::store::{Graph, GraphError, GraphResult};
use super::traits::Trait;
use super::types::{EdgeType, NodeId};
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

/// Offset reported when an index cannot be derived
pub const UNRESOLVED_INDEX: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

impl Graph {
    /// Inclusive start offset of a node into the content
    pub fn start_index(&self, id: &str) -> i64 {
        self.index_of(id, Bound::Start, &mut FxHashSet::default())
    }

    /// Exclusive end offset of a node into the content
    pub fn end_index(&self, id: &str) -> i64 {
        self.index_of(id, Bound::End, &mut FxHashSet::default())
    }

    fn index_of(&self, id: &str, bound: Bound, visiting: &mut FxHashSet<NodeId>) -> i64 {
        let Some(node) = self.get_node_by_id(id) else {
            return UNRESOLVED_INDEX;
        };
        if !visiting.insert(node.id().clone()) {
            warn!(node = id, "cycle while computing node index");
            return UNRESOLVED_INDEX;
        }

        let index = if self.node_has_trait(id, Trait::Span) {
            span_index(node, bound)
        } else if self.node_has_trait(id, Trait::SpanContainer) {
            let edge_type = match bound {
                Bound::Start => EdgeType::FIRST,
                Bound::End => EdgeType::LAST,
            };
            match self.targets_of_type(id, edge_type).first() {
                Some(member) => self.index_of(member, bound, visiting),
                None => UNRESOLVED_INDEX,
            }
        } else {
            // Derived extent from children of a different type. An unresolved
            // child pulls the start down to -1.
            let indices = self
                .out_edges(id)
                .into_iter()
                .filter(|edge| !edge.edge_type.is_internal() && edge.target_type != *node.node_type())
                .map(|edge| self.index_of(&edge.target, bound, visiting));
            let reduced = match bound {
                Bound::Start => indices.min(),
                Bound::End => indices.max(),
            };
            reduced.unwrap_or(UNRESOLVED_INDEX)
        };

        visiting.remove(id);
        index
    }

    /// Text covered by a span or span container
    ///
    /// Offsets count Unicode scalar values. The end is clamped to the content
    /// length; unset content or an unresolved range yields an empty string.
    pub fn text(&self, id: &str) -> GraphResult<String> {
        if !self.node_exists(id) {
            return Err(GraphError::NodeNotFound(NodeId::new(id)));
        }
        if !self.node_has_trait(id, Trait::Span) && !self.node_has_trait(id, Trait::SpanContainer) {
            return Err(GraphError::MissingTrait {
                node: NodeId::new(id),
                operation: "getText",
                required: "span` or `spanContainer",
            });
        }

        let Some(content) = self.content() else {
            warn!(node = id, "text requested before graph content was set");
            return Ok(String::new());
        };
        let (start, end) = (self.start_index(id), self.end_index(id));
        if start < 0 || end < start {
            warn!(node = id, start, end, "cannot slice content for node");
            return Ok(String::new());
        }

        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let len = usize::try_from(end).unwrap_or(usize::MAX).saturating_sub(start);
        Ok(content.chars().skip(start).take(len).collect())
    }

    /// Nearest ancestor of `node_type` reachable through `child` edges
    pub fn first_parent_of_type(&self, id: &str, node_type: &str) -> GraphResult<Option<&Node>> {
        let mut found = None;
        self.walk_parents(id, node_type, |node| {
            found = Some(node);
            false
        })?;
        Ok(found)
    }

    /// Every ancestor of `node_type`, in depth-first visit order
    pub fn parents_of_type(&self, id: &str, node_type: &str) -> GraphResult<Vec<&Node>> {
        let mut found = Vec::new();
        self.walk_parents(id, node_type, |node| {
            found.push(node);
            true
        })?;
        Ok(found)
    }

    /// Depth-first walk up the `child` edges, starting from the direct
    /// parents. `on_match` returns whether the walk should continue.
    fn walk_parents<'g>(
        &'g self,
        id: &str,
        node_type: &str,
        mut on_match: impl FnMut(&'g Node) -> bool,
    ) -> GraphResult<()> {
        if !self.node_exists(id) {
            return Err(GraphError::NodeNotFound(NodeId::new(id)));
        }
        if !self.node_has_trait(id, Trait::Sequence) {
            return Err(GraphError::MissingTrait {
                node: NodeId::new(id),
                operation: "getParentsOfType",
                required: "sequence",
            });
        }
        if !self.has_node_type(node_type) {
            return Err(GraphError::UnknownNodeType(node_type.into()));
        }

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = self.sources_of_type(id, EdgeType::CHILD);
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(node) = self.get_node_by_id(&current) else {
                continue;
            };
            trace!(node = id, visiting = %current, "ancestor search");
            if node.node_type().as_str() == node_type && !on_match(node) {
                return Ok(());
            }
            stack.extend(
                self.sources_of_type(&current, EdgeType::CHILD)
                    .into_iter()
                    .filter(|parent| !visited.contains(parent)),
            );
        }
        Ok(())
    }
}

fn span_index(node: &Node, bound: Bound) -> i64 {
    let start = node.get_first_prop("start").and_then(|v| v.as_integer());
    let Some(start) = start else {
        warn!(node = %node.id(), "span node has no integer `start` property");
        return UNRESOLVED_INDEX;
    };
    match bound {
        Bound::Start => start,
        Bound::End => match node.get_first_prop("length").and_then(|v| v.as_integer()) {
            Some(length) => start.checked_add(length).unwrap_or_else(|| {
                warn!(node = %node.id(), start, length, "span end overflows");
                UNRESOLVED_INDEX
            }),
            None => {
                warn!(node = %node.id(), "span node has no integer `length` property");
                UNRESOLVED_INDEX
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::ValueKind;
    use crate::graph::traits::{SequenceAttrs, SpanContainerAttrs};

    /// Tokens "Mary", "had", "a", "lamb" over a four-word sentence
    fn sentence() -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        graph.set_content("Mary had a lamb");
        graph.set_node_type_as_span("TOK");
        graph.set_node_type_as_sequence("TOK", SequenceAttrs::default());
        let mut ids: Vec<NodeId> = Vec::new();
        for (start, length) in [(0, 4), (5, 3), (9, 1), (11, 4)] {
            let id = graph.create_node("TOK", None).unwrap();
            let mut node = graph.node_mut(&id).unwrap();
            node.add_prop(ValueKind::Integer, "start", Some(&start.to_string()));
            node.add_prop(ValueKind::Integer, "length", Some(&length.to_string()));
            if let Some(prev) = ids.last() {
                graph.node_mut(prev).unwrap().add_edge(&id, EdgeType::NEXT, None);
            }
            ids.push(id);
        }
        (graph, ids)
    }

    fn container(graph: &mut Graph, node_type: &str, first: &str, last: &str) -> NodeId {
        graph.set_node_type_as_span_container(node_type, SpanContainerAttrs::default());
        let id = graph.create_node(node_type, None).unwrap();
        let mut node = graph.node_mut(&id).unwrap();
        node.add_edge(first, EdgeType::FIRST, None);
        node.add_edge(last, EdgeType::LAST, None);
        id
    }

    #[test]
    fn test_span_indices_and_text() {
        let (graph, ids) = sentence();
        assert_eq!(graph.start_index(&ids[1]), 5);
        assert_eq!(graph.end_index(&ids[1]), 8);
        assert_eq!(graph.text(&ids[1]).unwrap(), "had");
    }

    #[test]
    fn test_span_without_start_is_unresolved() {
        let mut graph = Graph::new();
        graph.set_node_type_as_span("TOK");
        let id = graph.create_node("TOK", None).unwrap();
        assert_eq!(graph.start_index(&id), UNRESOLVED_INDEX);
        assert_eq!(graph.end_index(&id), UNRESOLVED_INDEX);
    }

    #[test]
    fn test_span_container_indices() {
        let (mut graph, ids) = sentence();
        let sb = container(&mut graph, "SB", &ids[1], &ids[3]);

        assert_eq!(graph.start_index(&sb), 5);
        assert_eq!(graph.end_index(&sb), 15);
        assert_eq!(graph.text(&sb).unwrap(), "had a lamb");
    }

    #[test]
    fn test_span_container_missing_edge() {
        let (mut graph, ids) = sentence();
        graph.set_node_type_as_span_container("SB", SpanContainerAttrs::default());
        let sb = graph.create_node("SB", None).unwrap();
        graph.node_mut(&sb).unwrap().add_edge(&ids[0], EdgeType::FIRST, None);

        assert_eq!(graph.start_index(&sb), 0);
        assert_eq!(graph.end_index(&sb), UNRESOLVED_INDEX);
        assert_eq!(graph.text(&sb).unwrap(), "");
    }

    #[test]
    fn test_derived_extent_from_children() {
        let (mut graph, ids) = sentence();
        let np = graph.create_node("NP", None).unwrap();
        graph.add_edge(&np, &ids[2], "child", None);
        graph.add_edge(&np, &ids[3], "child", None);
        // Same-typed children do not count
        let inner = graph.create_node("NP", None).unwrap();
        graph.add_edge(&np, &inner, "child", None);

        assert_eq!(graph.start_index(&np), 9);
        assert_eq!(graph.end_index(&np), 15);

        let lonely = graph.create_node("NP", None).unwrap();
        assert_eq!(graph.start_index(&lonely), UNRESOLVED_INDEX);

        // An unresolved child makes the start unresolved; the end keeps its max
        let word = graph.create_node("W", None).unwrap();
        graph.add_edge(&np, &word, "child", None);
        assert_eq!(graph.start_index(&np), UNRESOLVED_INDEX);
        assert_eq!(graph.end_index(&np), 15);
    }

    #[test]
    fn test_span_end_overflow_is_unresolved() {
        let mut graph = Graph::new();
        graph.set_node_type_as_span("TOK");
        let id = graph.create_node("TOK", None).unwrap();
        let mut node = graph.node_mut(&id).unwrap();
        node.add_prop(ValueKind::Integer, "start", Some("9223372036854775807"));
        node.add_prop(ValueKind::Integer, "length", Some("1"));

        assert_eq!(graph.start_index(&id), i64::MAX);
        assert_eq!(graph.end_index(&id), UNRESOLVED_INDEX);
    }

    #[test]
    fn test_derived_extent_survives_cycle() {
        let mut graph = Graph::new();
        let a = graph.create_node("A", None).unwrap();
        let b = graph.create_node("B", None).unwrap();
        graph.add_edge(&a, &b, "child", None);
        graph.add_edge(&b, &a, "child", None);

        assert_eq!(graph.start_index(&a), UNRESOLVED_INDEX);
    }

    #[test]
    fn test_text_slices_by_chars_and_clamps() {
        let mut graph = Graph::new();
        graph.set_content("naïve café");
        graph.set_node_type_as_span("TOK");
        let id = graph.create_node("TOK", None).unwrap();
        let mut node = graph.node_mut(&id).unwrap();
        node.add_prop(ValueKind::Integer, "start", Some("6"));
        node.add_prop(ValueKind::Integer, "length", Some("40"));

        assert_eq!(graph.text(&id).unwrap(), "café");
    }

    #[test]
    fn test_text_without_content_is_empty() {
        let (mut graph, _) = sentence();
        graph.set_node_type_as_span("W");
        let id = graph.create_node("W", None).unwrap();
        graph.node_mut(&id).unwrap().add_prop(ValueKind::Integer, "start", Some("0"));
        graph.node_mut(&id).unwrap().add_prop(ValueKind::Integer, "length", Some("1"));
        assert_eq!(graph.text(&id).unwrap(), "M");

        let mut bare = Graph::new();
        bare.set_node_type_as_span("W");
        let id = bare.create_node("W", None).unwrap();
        assert_eq!(bare.text(&id).unwrap(), "");
    }

    #[test]
    fn test_text_requires_span_trait() {
        let mut graph = Graph::new();
        let id = graph.create_node("DOC", None).unwrap();
        assert_eq!(
            graph.text(&id).unwrap_err().to_string(),
            format!(
                "Calling `getText` on node `{}` that does not have the `span` or `spanContainer` trait",
                id
            )
        );
    }

    #[test]
    fn test_first_parent_of_type() {
        let (mut graph, ids) = sentence();
        let sb = container(&mut graph, "SB", &ids[0], &ids[3]);
        graph.create_node("PARAGRAPH", None).unwrap();

        let found = graph.first_parent_of_type(&ids[2], "SB").unwrap();
        assert_eq!(found.map(|node| node.id().clone()), Some(sb));

        // Known type without an ancestor of that type
        assert!(graph.first_parent_of_type(&ids[2], "PARAGRAPH").unwrap().is_none());

        assert_eq!(
            graph.first_parent_of_type(&ids[2], "CHAPTER").unwrap_err(),
            GraphError::UnknownNodeType("CHAPTER".into())
        );
    }

    #[test]
    fn test_parents_of_type_walks_nested_containers() {
        let (mut graph, ids) = sentence();
        let sb1 = container(&mut graph, "SB", &ids[0], &ids[1]);
        let sb2 = container(&mut graph, "SB", &ids[2], &ids[3]);
        let outer = container(&mut graph, "SB", &ids[0], &ids[3]);

        let found: Vec<NodeId> = graph
            .parents_of_type(&ids[0], "SB")
            .unwrap()
            .into_iter()
            .map(|node| node.id().clone())
            .collect();
        assert_eq!(found, vec![outer.clone(), sb1]);

        let found: Vec<NodeId> = graph
            .parents_of_type(&ids[3], "SB")
            .unwrap()
            .into_iter()
            .map(|node| node.id().clone())
            .collect();
        assert_eq!(found, vec![outer, sb2]);
    }

    #[test]
    fn test_ancestor_search_requires_sequence_trait() {
        let (mut graph, ids) = sentence();
        let sb = container(&mut graph, "SB", &ids[0], &ids[3]);
        assert!(matches!(
            graph.parents_of_type(&sb, "SB"),
            Err(GraphError::MissingTrait { .. })
        ));
        assert_eq!(
            graph.parents_of_type("999", "SB").unwrap_err(),
            GraphError::NodeNotFound(NodeId::new("999"))
        );
    }
}
