//! # Session Module
//!
//! A selection session over a graph shared with other sessions.
//!
//! - The graph sits behind one `RwLock`: sessions read it concurrently,
//!   `append_node`/`patch_parameters` take it exclusively.
//! - Selection state is owned by the session. Mutating it needs
//!   `&mut Session`, so the caller's guard around the session is the single
//!   exclusion scope for the whole narrowing and rollback sequence.

use crate::graph::{GraphStore, GraphSummary, StaleClosureWarning};
use crate::merge::{MergeEngine, MergedConfig};
use crate::selection::{Selection, SelectionEngine, SelectionPhase, ValidOptions};
use crate::{ConfigNode, Document, LayerConfError, NodeName};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A graph shared between sessions.
pub type SharedGraph = Arc<RwLock<GraphStore>>;

/// Wrap a graph for sharing.
#[must_use]
pub fn share(graph: GraphStore) -> SharedGraph {
    Arc::new(RwLock::new(graph))
}

/// One user's selection over a shared graph.
#[derive(Debug)]
pub struct Session {
    graph: SharedGraph,
    engine: SelectionEngine,
}

impl Session {
    /// Start a session with nothing selected.
    pub fn new(graph: SharedGraph) -> Result<Self, LayerConfError> {
        let engine = {
            let store = read(&graph)?;
            SelectionEngine::new(&store)
        };
        Ok(Self { graph, engine })
    }

    /// Build a graph and open a session on it.
    pub fn from_graph(graph: GraphStore) -> Result<Self, LayerConfError> {
        Self::new(share(graph))
    }

    /// Handle to the shared graph, for opening sibling sessions.
    #[must_use]
    pub fn graph(&self) -> SharedGraph {
        Arc::clone(&self.graph)
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Replace the selection. See `SelectionEngine::set_selection`.
    pub fn set_selection(&mut self, names: &[NodeName]) -> Result<ValidOptions, LayerConfError> {
        let graph = read(&self.graph)?;
        self.engine.set_selection(&graph, names).cloned()
    }

    /// Clear the selection.
    pub fn reset_selection(&mut self) -> Result<ValidOptions, LayerConfError> {
        let graph = read(&self.graph)?;
        Ok(self.engine.reset(&graph).clone())
    }

    /// Options valid under the committed selection.
    #[must_use]
    pub fn valid_options(&self) -> &ValidOptions {
        self.engine.current_valid_options()
    }

    /// Selected names in selection order.
    #[must_use]
    pub fn current_selection(&self) -> &Selection {
        self.engine.current_selection()
    }

    /// Empty, partial or complete.
    pub fn phase(&self) -> Result<SelectionPhase, LayerConfError> {
        let graph = read(&self.graph)?;
        Ok(self.engine.phase(&graph))
    }

    // =========================================================================
    // MERGE
    // =========================================================================

    /// Merge the parameters of the selected nodes in ascending layer order.
    pub fn merged_config(&self) -> Result<MergedConfig, LayerConfError> {
        let graph = read(&self.graph)?;

        let mut by_layer = BTreeMap::new();
        for name in self.engine.current_selection().names() {
            let node = graph.node_by_name(name)?;
            by_layer.insert(node.layer, node.parameters.clone());
        }

        Ok(MergeEngine::merge_layers(by_layer.into_values()))
    }

    // =========================================================================
    // GRAPH ACCESS
    // =========================================================================

    /// Clone a node out of the graph.
    pub fn node(&self, name: &NodeName) -> Result<ConfigNode, LayerConfError> {
        read(&self.graph)?.node_by_name(name).cloned()
    }

    /// Counts and names per layer.
    pub fn summary(&self) -> Result<GraphSummary, LayerConfError> {
        Ok(read(&self.graph)?.summary())
    }

    /// Add a node to the shared graph without computing closures.
    pub fn append_node(&self, node: ConfigNode) -> Result<StaleClosureWarning, LayerConfError> {
        write(&self.graph)?.append_node(node)
    }

    /// Replace top-level parameter keys of a node in the shared graph.
    pub fn patch_parameters(
        &self,
        name: &NodeName,
        patch: BTreeMap<String, Document>,
    ) -> Result<ConfigNode, LayerConfError> {
        write(&self.graph)?
            .patch_parameters(name, patch)
            .cloned()
    }
}

fn read(graph: &SharedGraph) -> Result<RwLockReadGuard<'_, GraphStore>, LayerConfError> {
    graph
        .read()
        .map_err(|_| LayerConfError::LockPoisoned("graph"))
}

fn write(graph: &SharedGraph) -> Result<RwLockWriteGuard<'_, GraphStore>, LayerConfError> {
    graph
        .write()
        .map_err(|_| LayerConfError::LockPoisoned("graph"))
}

// =============================================================================
// TESTS
// =============================================================================
