//! # Record Loader
//!
//! Converts raw node records, as exported by the record store, into
//! `ConfigNode`s and builds the graph.
//!
//! Record shape:
//!
//! ```json
//! {"Name": "fast", "meta": {"layer": 1}, "parameters": {...},
//!  "parents": ["det"], "children": ["cal1"]}
//! ```
//!
//! Missing edge lists default to empty; unknown fields are ignored.

use crate::graph::GraphStore;
use crate::primitives::MAX_NODE_NAME_LENGTH;
use crate::{ConfigNode, Document, LayerConfError, LayerId, NodeName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Record metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub layer: u32,
}

/// A node record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "Name")]
    pub name: String,
    pub meta: RecordMeta,
    #[serde(default)]
    pub parameters: Document,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl NodeRecord {
    /// Validate a record before it becomes a node.
    ///
    /// Rejects empty names and names longer than `MAX_NODE_NAME_LENGTH`.
    pub fn validate(&self) -> Result<(), LayerConfError> {
        if self.name.is_empty() {
            return Err(LayerConfError::InvalidInput(
                "record has an empty Name".to_string(),
            ));
        }
        if self.name.len() > MAX_NODE_NAME_LENGTH {
            return Err(LayerConfError::InvalidInput(format!(
                "Name length {} exceeds maximum {} bytes",
                self.name.len(),
                MAX_NODE_NAME_LENGTH
            )));
        }
        Ok(())
    }

    /// Validate and convert.
    pub fn into_node(self) -> Result<ConfigNode, LayerConfError> {
        self.validate()?;
        Ok(ConfigNode {
            name: NodeName(self.name),
            layer: LayerId(self.meta.layer),
            parameters: self.parameters,
            parents: to_names(self.parents),
            children: to_names(self.children),
        })
    }
}

impl From<&ConfigNode> for NodeRecord {
    fn from(node: &ConfigNode) -> Self {
        Self {
            name: node.name.as_str().to_string(),
            meta: RecordMeta {
                layer: node.layer.value(),
            },
            parameters: node.parameters.clone(),
            parents: node.parents.iter().map(|p| p.as_str().to_string()).collect(),
            children: node.children.iter().map(|c| c.as_str().to_string()).collect(),
        }
    }
}

fn to_names(list: Vec<String>) -> BTreeSet<NodeName> {
    list.into_iter().map(NodeName).collect()
}

/// Validate every record and build the graph.
pub fn load_graph(records: Vec<NodeRecord>) -> Result<GraphStore, LayerConfError> {
    let nodes = records
        .into_iter()
        .map(NodeRecord::into_node)
        .collect::<Result<Vec<_>, _>>()?;
    GraphStore::build(nodes)
}

/// Parse a JSON array of records.
pub fn records_from_json(bytes: &[u8]) -> Result<Vec<NodeRecord>, LayerConfError> {
    serde_json::from_slice(bytes).map_err(|e| LayerConfError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
