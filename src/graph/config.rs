//! Graph configuration

use serde::{Deserialize, Serialize};

/// Default document format version tag
pub const DEFAULT_GRAPH_VERSION: &str = "2.0";

/// Options fixed at graph construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Version tag reported by the graph
    pub version: String,
    /// Run the link procedure when a node is added and after each
    /// `NodeMut::add_edge`. Bulk loaders turn this off and call
    /// `Graph::link_nodes` once at the end.
    pub link_on_add: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_GRAPH_VERSION.to_string(),
            link_on_add: true,
        }
    }
}
