//! # Core Type Definitions
//!
//! This module contains the value types shared by every engine component:
//! - Identifiers (`NodeName`, `LayerId`)
//! - The parameter payload (`Document`)
//! - Configuration options (`ConfigNode`)
//! - Error types (`LayerConfError`)
//!
//! ## Determinism Guarantees
//!
//! All collections in this module are `BTreeMap`/`BTreeSet`, so iteration
//! order never depends on hashing or insertion history.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique name of a configuration option.
/// The name is the primary key for every lookup in the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(pub String);

impl NodeName {
    /// Create a new node name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Category a node belongs to. Layers are ordered; lower layers are
/// overridden by higher ones when documents are merged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl LayerId {
    /// Get the raw layer index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// An arbitrary nested parameter document.
///
/// Deserializes untagged, so any JSON value maps onto exactly one variant.
/// Mapping keys are kept sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Document {
    /// Absent / explicit "no override".
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Document>),
    Mapping(BTreeMap<String, Document>),
}

impl Document {
    /// Create an empty mapping document.
    #[must_use]
    pub fn mapping() -> Self {
        Self::Mapping(BTreeMap::new())
    }

    /// Check for the null variant.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the inner mapping, if this is one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Document>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key path through nested mappings.
    ///
    /// Returns `None` as soon as a segment is missing or a non-mapping is hit.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Document> {
        path.iter()
            .try_fold(self, |doc, key| doc.as_mapping()?.get(*key))
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

// =============================================================================
// CONFIG NODE
// =============================================================================

/// A single configuration option.
///
/// Each node sits in exactly one layer and carries the parameter document it
/// contributes to a merged configuration. Parent and child names are the
/// direct compatibility edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    pub name: NodeName,
    pub layer: LayerId,
    pub parameters: Document,
    pub parents: BTreeSet<NodeName>,
    pub children: BTreeSet<NodeName>,
}

impl ConfigNode {
    /// Create a node with no edges and an empty parameter mapping.
    #[must_use]
    pub fn new(name: impl Into<String>, layer: u32) -> Self {
        Self {
            name: NodeName::new(name),
            layer: LayerId(layer),
            parameters: Document::mapping(),
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    /// Builder: set the parameter document.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Document) -> Self {
        self.parameters = parameters;
        self
    }

    /// Builder: add parent edges.
    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents
            .extend(parents.into_iter().map(|p| NodeName::new(p)));
        self
    }

    /// Builder: add child edges.
    #[must_use]
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children
            .extend(children.into_iter().map(|c| NodeName::new(c)));
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced by the engine.
///
/// Selection errors are always recoverable: the session is either left
/// unchanged or rolled back to the empty selection.
#[derive(Debug, Error)]
pub enum LayerConfError {
    /// Two nodes share a name.
    #[error("Duplicate node name: {0}")]
    DuplicateName(NodeName),

    /// A lookup or selection referenced a name that does not exist.
    #[error("Unknown node name: {0}")]
    UnknownName(NodeName),

    /// A single selection request named two nodes of the same layer.
    #[error("Layer {layer} selected twice: {first} and {second}")]
    DuplicateLayer {
        layer: LayerId,
        first: NodeName,
        second: NodeName,
    },

    /// Narrowing left no compatible options before every layer was filled.
    /// The selection has been rolled back to empty.
    #[error("Incompatible selection: {name} cannot be combined with {selected:?}")]
    IncompatibleSelection {
        name: NodeName,
        selected: Vec<NodeName>,
    },

    /// A record or request failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shared state was poisoned by a panicking holder.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
