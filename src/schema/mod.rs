//! Schema boundary
//!
//! A schema declares, per node type, its traits and the properties and edges
//! its nodes may carry. Schemas are plain serde types; loaders for concrete
//! formats produce a [`SchemaDocument`], which is resolved against its parents
//! into a merged [`Schema`].

pub mod resolve;

pub use resolve::{MemoryLocator, SchemaDocument, SchemaLocator};

use crate::graph::{Graph, NodeType, SequenceAttrs, SpanContainerAttrs, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Schema `{schema}` extends `{parent}`, which could not be found")]
    ParentNotFound { schema: String, parent: String },

    #[error("Schema `{schema}` extends node type `{node_type}`, which is not defined")]
    UnknownExtensionTarget { schema: String, node_type: NodeType },

    #[error("Schema lookup failed: {0}")]
    Lookup(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Upper bound on the number of values or edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    Bounded(u32),
    Unbounded,
}

impl Arity {
    /// Whether `count` items fit under this bound
    pub fn allows(&self, count: usize) -> bool {
        match self {
            Arity::Bounded(max) => count <= *max as usize,
            Arity::Unbounded => true,
        }
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::Bounded(1)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Bounded(max) => write!(f, "{}", max),
            Arity::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Value restrictions of a property
///
/// Ranges apply to numeric kinds, `items` enumerates the allowed strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Restrictions {
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
    pub items: Option<Vec<String>>,
}

impl Restrictions {
    pub fn in_range(&self, value: f64) -> bool {
        self.min_range.map_or(true, |min| min <= value) && self.max_range.map_or(true, |max| value <= max)
    }

    pub fn has_range(&self) -> bool {
        self.min_range.is_some() || self.max_range.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub readable_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub value_kind: ValueKind,
    #[serde(default)]
    pub min_arity: u32,
    #[serde(default)]
    pub max_arity: Arity,
    #[serde(default)]
    pub restrictions: Restrictions,
    #[serde(default)]
    pub priority: Option<String>,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        PropertySpec {
            name: name.into(),
            readable_name: None,
            description: None,
            value_kind,
            min_arity: 0,
            max_arity: Arity::default(),
            restrictions: Restrictions::default(),
            priority: None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.min_arity > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub name: String,
    #[serde(default)]
    pub readable_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_arity: u32,
    #[serde(default)]
    pub max_arity: Arity,
    /// Allowed target node types; empty allows any type
    #[serde(default)]
    pub target_node_types: Vec<NodeType>,
    #[serde(default)]
    pub target_min_arity: u32,
    #[serde(default = "unbounded")]
    pub target_max_arity: Arity,
}

fn unbounded() -> Arity {
    Arity::Unbounded
}

impl EdgeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        EdgeSpec {
            name: name.into(),
            readable_name: None,
            description: None,
            min_arity: 0,
            max_arity: Arity::default(),
            target_node_types: Vec::new(),
            target_min_arity: 0,
            target_max_arity: Arity::Unbounded,
        }
    }

    pub fn is_required(&self) -> bool {
        self.min_arity > 0
    }

    pub fn allows_target(&self, node_type: &NodeType) -> bool {
        self.target_node_types.is_empty() || self.target_node_types.contains(node_type)
    }
}

/// Trait declarations of one node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeTraits {
    pub span: bool,
    pub sequence: Option<SequenceAttrs>,
    pub span_container: Option<SpanContainerAttrs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeSpec {
    pub name: NodeType,
    #[serde(default)]
    pub readable_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub traits: NodeTraits,
    #[serde(default)]
    pub property_specs: IndexMap<String, PropertySpec>,
    #[serde(default)]
    pub edge_specs: IndexMap<String, EdgeSpec>,
}

impl NodeTypeSpec {
    pub fn new(name: impl Into<NodeType>) -> Self {
        NodeTypeSpec {
            name: name.into(),
            readable_name: None,
            description: None,
            traits: NodeTraits::default(),
            property_specs: IndexMap::new(),
            edge_specs: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, spec: PropertySpec) -> Self {
        self.property_specs.insert(spec.name.clone(), spec);
        self
    }

    pub fn with_edge(mut self, spec: EdgeSpec) -> Self {
        self.edge_specs.insert(spec.name.clone(), spec);
        self
    }

    pub fn with_traits(mut self, traits: NodeTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Add or replace the properties and edges declared by an extension
    fn extend_with(&mut self, extension: &NodeTypeSpec) {
        for (name, spec) in &extension.property_specs {
            self.property_specs.insert(name.clone(), spec.clone());
        }
        for (name, spec) in &extension.edge_specs {
            self.edge_specs.insert(name.clone(), spec.clone());
        }
    }
}

/// A fully merged schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: String,
    #[serde(default)]
    pub node_types: IndexMap<NodeType, NodeTypeSpec>,
}

impl Schema {
    pub fn new(id: impl Into<String>) -> Self {
        Schema {
            id: id.into(),
            node_types: IndexMap::new(),
        }
    }

    pub fn with_node_type(mut self, spec: NodeTypeSpec) -> Self {
        self.node_types.insert(spec.name.clone(), spec);
        self
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeTypeSpec> {
        self.node_types.get(name)
    }

    /// Register every declared trait with the graph and record this schema's
    /// id among the graph's schema URIs
    pub fn register_traits(&self, graph: &mut Graph) {
        for (name, spec) in &self.node_types {
            if spec.traits.span {
                graph.set_node_type_as_span(name.clone());
            }
            if let Some(attrs) = &spec.traits.sequence {
                graph.set_node_type_as_sequence(name.clone(), attrs.clone());
            }
            if let Some(attrs) = &spec.traits.span_container {
                graph.set_node_type_as_span_container(name.clone(), attrs.clone());
            }
        }
        graph.add_schema_uri(self.id.clone());
        debug!(schema = %self.id, node_types = self.node_types.len(), "registered schema traits");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_schema() -> Schema {
        Schema::new("pagis://tokens")
            .with_node_type(
                NodeTypeSpec::new("TOK")
                    .with_traits(NodeTraits {
                        span: true,
                        sequence: Some(SequenceAttrs { contiguous: true }),
                        span_container: None,
                    })
                    .with_property(PropertySpec::new("start", ValueKind::Integer)),
            )
            .with_node_type(NodeTypeSpec::new("SB").with_traits(NodeTraits {
                span: false,
                sequence: None,
                span_container: Some(SpanContainerAttrs {
                    span_type: Some(NodeType::new("TOK")),
                }),
            }))
    }

    #[test]
    fn test_register_traits() {
        let mut graph = Graph::new();
        token_schema().register_traits(&mut graph);

        let tok = graph.traits_of(&NodeType::new("TOK"));
        assert!(tok.span && tok.sequence && !tok.span_container);
        assert!(graph.traits_of(&NodeType::new("SB")).span_container);
        assert_eq!(graph.schema_uris(), vec!["pagis://tokens".to_string()]);
        assert_eq!(
            graph.node_types_as_span_container()[&NodeType::new("SB")].span_type,
            Some(NodeType::new("TOK"))
        );
    }

    #[test]
    fn test_arity_bounds() {
        assert!(Arity::Bounded(1).allows(1));
        assert!(!Arity::Bounded(1).allows(2));
        assert!(Arity::Unbounded.allows(10_000));
        assert_eq!(Arity::Unbounded.to_string(), "unbounded");
    }

    #[test]
    fn test_restrictions_range() {
        let restrictions = Restrictions {
            min_range: Some(0.0),
            max_range: None,
            items: None,
        };
        assert!(restrictions.in_range(3.0));
        assert!(!restrictions.in_range(-1.0));
        assert!(Restrictions::default().in_range(f64::MIN));
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "id": "pagis://core",
            "nodeTypes": {
                "TOK": {
                    "name": "TOK",
                    "traits": { "span": true, "sequence": { "contiguous": true } },
                    "propertySpecs": {
                        "pos": {
                            "name": "pos",
                            "valueKind": "string",
                            "minArity": 1,
                            "restrictions": { "items": ["NN", "VB"] }
                        }
                    },
                    "edgeSpecs": {
                        "head": { "name": "head", "maxArity": "unbounded", "targetNodeTypes": ["TOK"] }
                    }
                }
            }
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        let tok = schema.node_type("TOK").unwrap();

        assert!(tok.traits.span);
        assert_eq!(tok.traits.sequence, Some(SequenceAttrs { contiguous: true }));
        assert!(tok.property_specs["pos"].is_required());
        assert_eq!(tok.property_specs["pos"].max_arity, Arity::Bounded(1));
        assert_eq!(tok.edge_specs["head"].max_arity, Arity::Unbounded);
        assert_eq!(tok.edge_specs["head"].target_max_arity, Arity::Unbounded);
        assert!(tok.edge_specs["head"].allows_target(&NodeType::new("TOK")));
        assert!(!tok.edge_specs["head"].allows_target(&NodeType::new("SB")));
    }
}
