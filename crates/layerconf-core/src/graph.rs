//! # Graph Store
//!
//! Registry of configuration nodes and their transitive ancestry.
//!
//! Closures are computed once, for every node, when the store is built.
//! After that the store is read-mostly: `append_node` adds an option without
//! touching any closure, and `rebuild` recomputes everything.
//! All data structures use `BTreeMap`/`BTreeSet` for deterministic ordering.

use crate::{ConfigNode, Document, LayerConfError, LayerId, NodeName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

// =============================================================================
// ANCESTRY CLOSURE
// =============================================================================

/// Every node reachable from one node by following parent or child edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestryClosure {
    /// Reachable through `parents`, any number of hops.
    pub ancestors: BTreeSet<NodeName>,
    /// Reachable through `children`, any number of hops.
    pub descendants: BTreeSet<NodeName>,
}

impl AncestryClosure {
    /// Ancestors and descendants together, each name once.
    pub fn family(&self) -> BTreeSet<&NodeName> {
        self.ancestors.iter().chain(&self.descendants).collect()
    }

    /// Check whether `name` is an ancestor or a descendant.
    #[must_use]
    pub fn contains(&self, name: &NodeName) -> bool {
        self.ancestors.contains(name) || self.descendants.contains(name)
    }

    /// Check if no relatives were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty() && self.descendants.is_empty()
    }
}

/// Edge direction followed by a closure traversal.
#[derive(Debug, Clone, Copy)]
enum Direction {
    Parents,
    Children,
}

impl Direction {
    fn edges(self, node: &ConfigNode) -> &BTreeSet<NodeName> {
        match self {
            Self::Parents => &node.parents,
            Self::Children => &node.children,
        }
    }
}

// =============================================================================
// LAYERED INDEX
// =============================================================================

/// Node names grouped by layer, in load order within each layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayeredIndex {
    buckets: BTreeMap<LayerId, Vec<NodeName>>,
}

impl LayeredIndex {
    /// Number of populated layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.buckets.len()
    }

    /// Names in a layer. Unknown layers have no options.
    #[must_use]
    pub fn options_in_layer(&self, layer: LayerId) -> &[NodeName] {
        self.buckets.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All layers in ascending order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.buckets.keys().copied()
    }

    /// All `(layer, names)` pairs in ascending layer order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &[NodeName])> {
        self.buckets
            .iter()
            .map(|(layer, names)| (*layer, names.as_slice()))
    }

    fn push(&mut self, layer: LayerId, name: NodeName) {
        self.buckets.entry(layer).or_default().push(name);
    }
}

// =============================================================================
// STALE CLOSURE WARNING
// =============================================================================

/// Returned by `GraphStore::append_node`.
///
/// The appended node has no computed closure, and no existing closure knows
/// about it, until `GraphStore::rebuild` runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleClosureWarning {
    pub node: NodeName,
}

impl fmt::Display for StaleClosureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} appended without ancestry; rebuild the graph to make it selectable",
            self.node
        )
    }
}

// =============================================================================
// GRAPH SUMMARY
// =============================================================================

/// Counts and names for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub layer_count: usize,
    pub names_by_layer: BTreeMap<LayerId, Vec<NodeName>>,
}

// =============================================================================
// GRAPH STORE
// =============================================================================

/// Registry of configuration nodes with precomputed ancestry closures.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Node storage: name -> node
    nodes: BTreeMap<NodeName, ConfigNode>,

    /// Precomputed relatives: name -> closure
    closures: BTreeMap<NodeName, AncestryClosure>,

    /// Layer buckets
    index: LayeredIndex,

    /// Nodes appended since the last closure computation.
    stale: BTreeSet<NodeName>,
}

impl GraphStore {
    /// Build a store from a complete node collection.
    ///
    /// Fails with `DuplicateName` if two nodes share a name.
    pub fn build(nodes: impl IntoIterator<Item = ConfigNode>) -> Result<Self, LayerConfError> {
        let mut store = Self::default();

        for node in nodes {
            if store.nodes.contains_key(&node.name) {
                return Err(LayerConfError::DuplicateName(node.name));
            }
            store.index.push(node.layer, node.name.clone());
            store.nodes.insert(node.name.clone(), node);
        }

        store.compute_closures();

        let cyclic = store.cyclic_nodes();
        if !cyclic.is_empty() {
            tracing::warn!(
                nodes = ?cyclic,
                "parent/child edges form a cycle; ancestry of these nodes includes themselves"
            );
        }

        tracing::info!(
            nodes = store.nodes.len(),
            layers = store.index.layer_count(),
            "graph built"
        );
        Ok(store)
    }

    /// Get a node by name.
    pub fn node_by_name(&self, name: &NodeName) -> Result<&ConfigNode, LayerConfError> {
        self.nodes
            .get(name)
            .ok_or_else(|| LayerConfError::UnknownName(name.clone()))
    }

    /// Get the ancestry closure of a node.
    pub fn closure_of(&self, name: &NodeName) -> Result<&AncestryClosure, LayerConfError> {
        self.closures
            .get(name)
            .ok_or_else(|| LayerConfError::UnknownName(name.clone()))
    }

    /// Check if the store holds a node with this name.
    #[must_use]
    pub fn contains(&self, name: &NodeName) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of populated layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.index.layer_count()
    }

    /// Names in a layer, in load order.
    #[must_use]
    pub fn options_in_layer(&self, layer: LayerId) -> &[NodeName] {
        self.index.options_in_layer(layer)
    }

    /// The full layer index.
    #[must_use]
    pub fn layered_index(&self) -> &LayeredIndex {
        &self.index
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.values()
    }

    /// Nodes whose closures have not been computed yet.
    #[must_use]
    pub fn stale_nodes(&self) -> &BTreeSet<NodeName> {
        &self.stale
    }

    /// Nodes that appear among their own descendants.
    #[must_use]
    pub fn cyclic_nodes(&self) -> BTreeSet<&NodeName> {
        self.closures
            .iter()
            .filter(|(name, closure)| closure.descendants.contains(*name))
            .map(|(name, _)| name)
            .collect()
    }

    /// Status counts plus every name grouped by layer.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            node_count: self.nodes.len(),
            layer_count: self.index.layer_count(),
            names_by_layer: self
                .index
                .iter()
                .map(|(layer, names)| (layer, names.to_vec()))
                .collect(),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Add a node without computing any closure.
    ///
    /// The node joins its layer bucket (opening a new layer if needed) and gets
    /// an empty closure. Existing closures are left as they were.
    pub fn append_node(&mut self, node: ConfigNode) -> Result<StaleClosureWarning, LayerConfError> {
        if self.nodes.contains_key(&node.name) {
            return Err(LayerConfError::DuplicateName(node.name));
        }

        let warning = StaleClosureWarning {
            node: node.name.clone(),
        };
        tracing::warn!(node = %node.name, layer = %node.layer, "{}", warning);

        self.index.push(node.layer, node.name.clone());
        self.closures
            .insert(node.name.clone(), AncestryClosure::default());
        self.stale.insert(node.name.clone());
        self.nodes.insert(node.name.clone(), node);

        Ok(warning)
    }

    /// Replace top-level keys of a node's parameter mapping.
    ///
    /// A node whose parameters are not a mapping gets the patch as its new
    /// mapping. Closures are unaffected.
    pub fn patch_parameters(
        &mut self,
        name: &NodeName,
        patch: BTreeMap<String, Document>,
    ) -> Result<&ConfigNode, LayerConfError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| LayerConfError::UnknownName(name.clone()))?;

        match &mut node.parameters {
            Document::Mapping(map) => map.extend(patch),
            other => *other = Document::Mapping(patch),
        }

        tracing::debug!(node = %name, "parameters patched");
        Ok(&*node)
    }

    /// Recompute every closure from the current node set.
    pub fn rebuild(&mut self) {
        self.compute_closures();
        tracing::info!(nodes = self.nodes.len(), "closures rebuilt");
    }

    // =========================================================================
    // CLOSURE COMPUTATION
    // =========================================================================

    fn compute_closures(&mut self) {
        let closures: BTreeMap<NodeName, AncestryClosure> = self
            .nodes
            .values()
            .map(|node| {
                let closure = AncestryClosure {
                    ancestors: self.reachable(node, Direction::Parents),
                    descendants: self.reachable(node, Direction::Children),
                };
                (node.name.clone(), closure)
            })
            .collect();

        self.closures = closures;
        self.stale.clear();
    }

    /// Worklist traversal. Terminates on cycles because each name is
    /// expanded at most once.
    fn reachable(&self, start: &ConfigNode, direction: Direction) -> BTreeSet<NodeName> {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<&NodeName> = direction.edges(start).iter().collect();

        while let Some(name) = queue.pop_front() {
            let Some(node) = self.nodes.get(name) else {
                tracing::debug!(from = %start.name, missing = %name, "skipping dangling edge");
                continue;
            };
            if visited.insert(name.clone()) {
                queue.extend(direction.edges(node));
            }
        }

        visited
    }
}

// =============================================================================
// TESTS
// =============================================================================
