//! Parent schema resolution

use super::{NodeTypeSpec, Schema, SchemaError, SchemaResult};
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Source of already-resolved parent schemas
#[async_trait]
pub trait SchemaLocator: Send + Sync {
    /// Look up a schema by id; `Ok(None)` when the id is unknown
    async fn locate(&self, id: &str) -> SchemaResult<Option<Schema>>;
}

/// Locator backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    schemas: HashMap<String, Schema>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: Schema) {
        self.schemas.insert(schema.id.clone(), schema);
    }
}

#[async_trait]
impl SchemaLocator for MemoryLocator {
    async fn locate(&self, id: &str) -> SchemaResult<Option<Schema>> {
        Ok(self.schemas.get(id).cloned())
    }
}

/// Un-merged schema as produced by a loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaDocument {
    pub id: String,
    /// Ids of parent schemas, in precedence order
    pub extends: Vec<String>,
    /// Already merged; parents are not resolved again
    pub effective: bool,
    pub node_types: Vec<NodeTypeSpec>,
    pub node_type_extensions: Vec<NodeTypeSpec>,
}

impl SchemaDocument {
    /// Resolve every parent concurrently and merge the result
    ///
    /// Parent node types come first, in `extends` order, then this
    /// document's own types replace same-named ones, then extensions add or
    /// replace properties and edges of existing types.
    pub async fn resolve(&self, locator: &dyn SchemaLocator) -> SchemaResult<Schema> {
        let mut node_types = IndexMap::new();

        if !self.effective && !self.extends.is_empty() {
            let parents = join_all(self.extends.iter().map(|id| locator.locate(id))).await;
            for (parent_id, parent) in self.extends.iter().zip(parents) {
                let Some(parent) = parent? else {
                    return Err(SchemaError::ParentNotFound {
                        schema: self.id.clone(),
                        parent: parent_id.clone(),
                    });
                };
                debug!(schema = %self.id, parent = %parent_id, "merging parent schema");
                node_types.extend(parent.node_types);
            }
        }

        for spec in &self.node_types {
            node_types.insert(spec.name.clone(), spec.clone());
        }

        for extension in &self.node_type_extensions {
            let Some(target) = node_types.get_mut(&extension.name) else {
                return Err(SchemaError::UnknownExtensionTarget {
                    schema: self.id.clone(),
                    node_type: extension.name.clone(),
                });
            };
            target.extend_with(extension);
        }

        Ok(Schema {
            id: self.id.clone(),
            node_types,
        })
    }
}
