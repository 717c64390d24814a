//! Core type definitions for the annotation graph

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use super::property::parse_leading_integer;

/// Unique identifier for a node
///
/// Ids are strings on the wire but are ordered numerically when new ids are
/// generated. An empty id means "not assigned yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no id has been assigned
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric reading of the id used for id generation.
    ///
    /// Ids without a leading integer count as 0.
    pub fn numeric_value(&self) -> i64 {
        parse_leading_integer(&self.0).unwrap_or(0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// Node type (e.g., "TOK", "SB", "PARAGRAPH")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeType(String);

impl NodeType {
    pub fn new(node_type: impl Into<String>) -> Self {
        NodeType(node_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        NodeType(s)
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        NodeType(s.to_string())
    }
}

impl Borrow<str> for NodeType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeType {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// Edge type; disambiguates parallel edges between the same pair of nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeType(String);

impl EdgeType {
    /// Sequence successor
    pub const NEXT: &'static str = "next";
    /// First member of a span container
    pub const FIRST: &'static str = "first";
    /// Last member of a span container
    pub const LAST: &'static str = "last";
    /// Shadow edge from a container to every member it covers
    pub const CHILD: &'static str = "internal-node-tracking-child";

    pub fn new(edge_type: impl Into<String>) -> Self {
        EdgeType(edge_type.into())
    }

    pub fn next() -> Self {
        EdgeType::new(Self::NEXT)
    }

    pub fn first() -> Self {
        EdgeType::new(Self::FIRST)
    }

    pub fn last() -> Self {
        EdgeType::new(Self::LAST)
    }

    pub fn child() -> Self {
        EdgeType::new(Self::CHILD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }

    /// Internal tracking edges are hidden from the public edge queries
    pub fn is_internal(&self) -> bool {
        self.0 == Self::CHILD
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EdgeType {
    fn from(s: String) -> Self {
        EdgeType(s)
    }
}

impl From<&str> for EdgeType {
    fn from(s: &str) -> Self {
        EdgeType(s.to_string())
    }
}
