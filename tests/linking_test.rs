//! End-to-end tests of the link engine over a small annotated document
//!
//! The document is "Mary had a little lamb." tokenized into six `TOK` nodes
//! (span + sequence) grouped by one `SB` sentence container.

use pagis::graph::{
    EdgeType, Graph, GraphConfig, GraphError, Node, NodeId, SequenceAttrs, SpanContainerAttrs,
    ValueKind, UNRESOLVED_INDEX,
};

const CONTENT: &str = "Mary had a little lamb.";
const TOKENS: [(i64, i64); 6] = [(0, 4), (5, 3), (9, 1), (11, 6), (18, 4), (22, 1)];

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn register_traits(graph: &mut Graph) {
    graph.set_content(CONTENT);
    graph.set_node_type_as_span("TOK");
    graph.set_node_type_as_sequence("TOK", SequenceAttrs { contiguous: true });
    graph.set_node_type_as_span_container(
        "SB",
        SpanContainerAttrs {
            span_type: Some("TOK".into()),
        },
    );
}

fn add_token(graph: &mut Graph, start: i64, length: i64) -> NodeId {
    let id = graph.create_node("TOK", None).unwrap();
    let mut node = graph.node_mut(&id).unwrap();
    node.add_prop(ValueKind::Integer, "start", Some(&start.to_string()));
    node.add_prop(ValueKind::Integer, "length", Some(&length.to_string()));
    id
}

/// Tokens chained by `next`, plus the sentence over all of them
fn mary() -> (Graph, Vec<NodeId>, NodeId) {
    init_tracing();
    let mut graph = Graph::new();
    register_traits(&mut graph);

    let tokens: Vec<NodeId> = TOKENS
        .iter()
        .map(|&(start, length)| add_token(&mut graph, start, length))
        .collect();
    for pair in tokens.windows(2) {
        graph.node_mut(&pair[0]).unwrap().add_edge(&pair[1], EdgeType::NEXT, None);
    }

    let sb = graph.create_node("SB", None).unwrap();
    let mut sentence = graph.node_mut(&sb).unwrap();
    sentence.add_edge(&tokens[0], EdgeType::FIRST, None);
    sentence.add_edge(&tokens[5], EdgeType::LAST, None);
    (graph, tokens, sb)
}

fn chain_text(graph: &Graph, head: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = graph.node(head);
    while let Some(node) = current {
        words.push(node.text().unwrap());
        current = node.next().unwrap();
    }
    words
}

#[test]
fn test_document_reads_in_order() {
    let (graph, tokens, sb) = mary();

    assert_eq!(
        chain_text(&graph, &tokens[0]),
        vec!["Mary", "had", "a", "little", "lamb", "."]
    );
    let sentence = graph.node(&sb).unwrap();
    assert_eq!(sentence.text().unwrap(), CONTENT);
    assert_eq!(sentence.start_index(), 0);
    assert_eq!(sentence.end_index(), 23);
}

#[test]
fn test_container_tracks_every_member() {
    let (graph, tokens, sb) = mary();

    for token in &tokens {
        assert!(graph.edge_exists(&sb, token, EdgeType::CHILD));
    }
    // Shadow edges stay out of the public edge list
    assert_eq!(graph.node(&sb).unwrap().edges().len(), 2);
}

#[test]
fn test_insert_mid_chain() {
    let (mut graph, tokens, sb) = mary();

    // "Mary had a very little lamb."
    graph.set_content("Mary had a very little lamb.");
    let very = add_token(&mut graph, 11, 4);
    graph.node_mut(&very).unwrap().add_edge(&tokens[3], EdgeType::NEXT, None);

    let a = graph.node(&tokens[2]).unwrap();
    assert_eq!(a.next().unwrap().map(|n| n.id().clone()), Some(very.clone()));
    let inserted = graph.node(&very).unwrap();
    assert_eq!(
        inserted.previous().unwrap().map(|n| n.id().clone()),
        Some(tokens[2].clone())
    );
    assert_eq!(
        inserted.next().unwrap().map(|n| n.id().clone()),
        Some(tokens[3].clone())
    );
    assert!(graph.edge_exists(&sb, &very, EdgeType::CHILD));
    assert_eq!(
        inserted
            .first_parent_of_type("SB")
            .unwrap()
            .map(|n| n.id().clone()),
        Some(sb)
    );
}

#[test]
fn test_remove_node_repairs_chain() {
    let (mut graph, tokens, sb) = mary();

    let removed = graph.remove_node(&tokens[3]).unwrap();
    assert_eq!(removed.graph(), None);

    let a = graph.node(&tokens[2]).unwrap();
    assert_eq!(
        a.next().unwrap().map(|n| n.id().clone()),
        Some(tokens[4].clone())
    );
    let lamb = graph.node(&tokens[4]).unwrap();
    assert_eq!(
        lamb.previous().unwrap().map(|n| n.id().clone()),
        Some(tokens[2].clone())
    );
    assert!(!graph.edge_exists(&sb, &tokens[3], EdgeType::CHILD));
    assert_eq!(graph.in_edges(&tokens[4]).len(), 2);
}

#[test]
fn test_remove_edges_mid_chain_disconnects_first() {
    let (mut graph, tokens, _) = mary();

    graph.node_mut(&tokens[2]).unwrap().remove_edges();

    assert!(graph.out_edges(&tokens[2]).is_empty());
    assert!(graph.edge_exists(&tokens[1], &tokens[3], EdgeType::NEXT));
    let little = graph.node(&tokens[3]).unwrap();
    assert_eq!(
        little.previous().unwrap().map(|n| n.id().clone()),
        Some(tokens[1].clone())
    );
    let a = graph.node(&tokens[2]).unwrap();
    assert!(!a.has_next());
    assert!(!a.has_previous());
}

#[test]
fn test_remove_container_boundary() {
    let (mut graph, tokens, sb) = mary();

    graph.remove_node(&tokens[0]).unwrap();

    // The `first` edge went with the node
    let sentence = graph.node(&sb).unwrap();
    assert!(sentence.first().unwrap().is_none());
    assert_eq!(sentence.start_index(), UNRESOLVED_INDEX);
    assert_eq!(sentence.text().unwrap(), "");
    assert!(!graph.node(&tokens[1]).unwrap().has_previous());
}

#[test]
fn test_remove_next_edge_splices() {
    let (mut graph, tokens, _) = mary();

    let edge = graph.get_edge(&tokens[1], &tokens[2], EdgeType::NEXT).unwrap().clone();
    graph.node_mut(&tokens[1]).unwrap().remove_edge(&edge).unwrap();

    assert!(graph.edge_exists(&tokens[0], &tokens[2], EdgeType::NEXT));
    assert!(!graph.node(&tokens[1]).unwrap().has_next());
    assert!(!graph.node(&tokens[1]).unwrap().has_previous());
}

#[test]
fn test_remove_edges_drops_shadow_edges() {
    let (mut graph, tokens, sb) = mary();

    graph.node_mut(&sb).unwrap().remove_edges();
    assert!(graph.out_edges(&sb).is_empty());
    assert!(graph
        .node(&tokens[2])
        .unwrap()
        .first_parent_of_type("SB")
        .unwrap()
        .is_none());
}

#[test]
fn test_ancestor_search_contract() {
    let (graph, tokens, sb) = mary();
    let token = graph.node(&tokens[4]).unwrap();

    let parents = token.parents_of_type("SB").unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].id(), &sb);
    assert!(token.parents_of_type("TOK").unwrap().is_empty());
    assert_eq!(
        token.first_parent_of_type("PARAGRAPH").unwrap_err(),
        GraphError::UnknownNodeType("PARAGRAPH".into())
    );
}

#[test]
fn test_dangling_edges_are_skipped() {
    let (mut graph, tokens, _) = mary();
    let before = graph.edge_count();

    assert!(!graph.add_edge(&tokens[0], "404", "dependency", None));
    assert!(!graph.add_edge("404", &tokens[0], "dependency", None));
    assert!(!graph.add_edge("404", "405", "dependency", None));
    assert_eq!(graph.edge_count(), before);
}

#[test]
fn test_bulk_load_then_link() {
    init_tracing();
    let mut graph = Graph::with_config(GraphConfig {
        link_on_add: false,
        ..GraphConfig::default()
    });
    register_traits(&mut graph);

    let ids: Vec<NodeId> = (1..=3)
        .map(|i| graph.add_node(Node::with_id(i.to_string(), "TOK")).unwrap())
        .collect();
    let sb = graph.add_node(Node::with_id("10", "SB")).unwrap();
    graph.node_mut(&ids[0]).unwrap().add_edge(&ids[1], EdgeType::NEXT, None);
    graph.node_mut(&ids[1]).unwrap().add_edge(&ids[2], EdgeType::NEXT, None);
    let mut sentence = graph.node_mut(&sb).unwrap();
    sentence.add_edge(&ids[0], EdgeType::FIRST, None);
    sentence.add_edge(&ids[2], EdgeType::LAST, None);
    // Node-level edge adds do not link while loading
    for id in &ids {
        assert!(!graph.edge_exists(&sb, id, EdgeType::CHILD));
    }

    graph.link_nodes();
    for id in &ids {
        assert!(graph.edge_exists(&sb, id, EdgeType::CHILD));
    }
    // Next generated id follows the largest numeric id
    assert_eq!(graph.create_node("TOK", None).unwrap().as_str(), "11");
}
