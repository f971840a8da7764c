//! # Selection Engine
//!
//! Per-session choice of one option per layer, and the live set of options
//! still compatible with everything chosen so far.
//!
//! ## Narrowing
//!
//! An unoccupied-layer option stays valid only if it lies in the ancestor or
//! descendant closure of *every* selected node. Each selected node's family
//! is counted once, and only names whose count equals the selection size
//! survive.
//!
//! ## Atomicity
//!
//! `set_selection` rebuilds the selection on local values and publishes it
//! with one assignment. A rejected request either leaves the committed state
//! untouched (validation errors) or replaces it with the empty selection
//! (incompatibility). Intermediate steps are never observable.

use crate::graph::{GraphStore, LayeredIndex};
use crate::primitives::MAX_SELECTION_LENGTH;
use crate::{ConfigNode, LayerConfError, LayerId, NodeName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SELECTION
// =============================================================================

/// Selected node names in the order they were chosen.
///
/// Invariant: no two names share a layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    names: Vec<NodeName>,
}

impl Selection {
    /// Names in selection order.
    #[must_use]
    pub fn names(&self) -> &[NodeName] {
        &self.names
    }

    /// Number of selected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check if a name is part of the selection.
    #[must_use]
    pub fn contains(&self, name: &NodeName) -> bool {
        self.names.contains(name)
    }
}

// =============================================================================
// VALID OPTIONS
// =============================================================================

/// Selectable names per layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidOptions {
    layers: BTreeMap<LayerId, BTreeSet<NodeName>>,
}

impl ValidOptions {
    /// Every node of the index is valid.
    #[must_use]
    pub fn full(index: &LayeredIndex) -> Self {
        Self {
            layers: index
                .iter()
                .map(|(layer, names)| (layer, names.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Names still selectable in a layer.
    #[must_use]
    pub fn options_in_layer(&self, layer: LayerId) -> Option<&BTreeSet<NodeName>> {
        self.layers.get(&layer)
    }

    /// Check if `name` may be chosen for `layer`.
    #[must_use]
    pub fn allows(&self, layer: LayerId, name: &NodeName) -> bool {
        self.layers
            .get(&layer)
            .is_some_and(|names| names.contains(name))
    }

    /// Number of names left across layers not in `occupied`.
    #[must_use]
    pub fn open_count(&self, occupied: &BTreeSet<LayerId>) -> usize {
        self.layers
            .iter()
            .filter(|(layer, _)| !occupied.contains(*layer))
            .map(|(_, names)| names.len())
            .sum()
    }

    /// Layer-by-layer subset check.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.layers.iter().all(|(layer, names)| {
            other
                .layers
                .get(layer)
                .is_some_and(|wider| names.is_subset(wider))
        })
    }

    /// All `(layer, names)` pairs in ascending layer order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &BTreeSet<NodeName>)> {
        self.layers.iter().map(|(layer, names)| (*layer, names))
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<LayerId, BTreeSet<NodeName>> {
        &self.layers
    }
}

// =============================================================================
// SELECTION PHASE
// =============================================================================

/// How far a selection is from one option per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPhase {
    Empty,
    Partial,
    Complete,
}

impl SelectionPhase {
    /// Classify a selection size against the number of layers.
    #[must_use]
    pub fn of(selected: usize, layer_count: usize) -> Self {
        if selected == 0 {
            Self::Empty
        } else if selected < layer_count {
            Self::Partial
        } else {
            Self::Complete
        }
    }
}

// =============================================================================
// SELECTION ENGINE
// =============================================================================

/// The committed state, always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Committed {
    selection: Selection,
    valid_options: ValidOptions,
}

impl Committed {
    fn empty(graph: &GraphStore) -> Self {
        Self {
            selection: Selection::default(),
            valid_options: ValidOptions::full(graph.layered_index()),
        }
    }
}

/// Mutable per-session selection state.
///
/// The engine does not own the graph; every operation borrows it, so many
/// engines can share one `GraphStore`.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    committed: Committed,
}

impl SelectionEngine {
    /// Create an engine with nothing selected.
    #[must_use]
    pub fn new(graph: &GraphStore) -> Self {
        Self {
            committed: Committed::empty(graph),
        }
    }

    /// Clear the selection; every option becomes valid again.
    pub fn reset(&mut self, graph: &GraphStore) -> &ValidOptions {
        self.committed = Committed::empty(graph);
        &self.committed.valid_options
    }

    /// Replace the whole selection.
    ///
    /// Names are applied in the given order, narrowing after each one. A step
    /// is rejected only when no option is left in any unoccupied layer while
    /// fewer names than layers are selected.
    /// - `UnknownName`, `DuplicateLayer`, `InvalidInput`: nothing changes.
    /// - `IncompatibleSelection`: the selection is rolled back to empty.
    pub fn set_selection(
        &mut self,
        graph: &GraphStore,
        names: &[NodeName],
    ) -> Result<&ValidOptions, LayerConfError> {
        if names.is_empty() {
            return Ok(self.reset(graph));
        }
        if names.len() > MAX_SELECTION_LENGTH {
            return Err(LayerConfError::InvalidInput(format!(
                "selection of {} names exceeds maximum {}",
                names.len(),
                MAX_SELECTION_LENGTH
            )));
        }

        let nodes = Self::resolve(graph, names)?;
        let layer_count = graph.layer_count();

        let mut valid = ValidOptions::full(graph.layered_index());
        let mut selected: Vec<&ConfigNode> = Vec::with_capacity(nodes.len());
        let mut occupied = BTreeSet::new();

        for node in nodes {
            selected.push(node);
            occupied.insert(node.layer);
            valid = Self::narrow(graph, &selected)?;

            let open = valid.open_count(&occupied);
            tracing::debug!(node = %node.name, step = selected.len(), open, "selection narrowed");

            if open == 0 && selected.len() < layer_count {
                selected.pop();
                return Err(self.roll_back(graph, node, &selected));
            }
        }

        self.committed = Committed {
            selection: Selection {
                names: selected.iter().map(|node| node.name.clone()).collect(),
            },
            valid_options: valid,
        };
        Ok(&self.committed.valid_options)
    }

    /// Selected names in selection order.
    #[must_use]
    pub fn current_selection(&self) -> &Selection {
        &self.committed.selection
    }

    /// Options valid under the committed selection.
    #[must_use]
    pub fn current_valid_options(&self) -> &ValidOptions {
        &self.committed.valid_options
    }

    /// Empty, partial or complete, against the graph's layer count.
    #[must_use]
    pub fn phase(&self, graph: &GraphStore) -> SelectionPhase {
        SelectionPhase::of(self.committed.selection.len(), graph.layer_count())
    }

    /// Compute valid options for a set of selected nodes.
    ///
    /// Occupied layers hold exactly their selected node. Every other layer
    /// holds the names found in the family of all selected nodes.
    pub fn narrow(
        graph: &GraphStore,
        selected: &[&ConfigNode],
    ) -> Result<ValidOptions, LayerConfError> {
        if selected.is_empty() {
            return Ok(ValidOptions::full(graph.layered_index()));
        }

        let occupied: BTreeSet<LayerId> = selected.iter().map(|node| node.layer).collect();

        let mut counts: BTreeMap<&NodeName, (LayerId, usize)> = BTreeMap::new();
        for node in selected {
            for name in graph.closure_of(&node.name)?.family() {
                let candidate = graph.node_by_name(name)?;
                if !occupied.contains(&candidate.layer) {
                    counts.entry(name).or_insert((candidate.layer, 0)).1 += 1;
                }
            }
        }

        let mut layers: BTreeMap<LayerId, BTreeSet<NodeName>> = graph
            .layered_index()
            .layers()
            .map(|layer| (layer, BTreeSet::new()))
            .collect();

        for node in selected {
            layers
                .entry(node.layer)
                .or_default()
                .insert(node.name.clone());
        }

        for (name, (layer, count)) in counts {
            if count == selected.len() {
                layers.entry(layer).or_default().insert(name.clone());
            }
        }

        Ok(ValidOptions { layers })
    }

    /// Look up every name and check one-per-layer.
    fn resolve<'g>(
        graph: &'g GraphStore,
        names: &[NodeName],
    ) -> Result<Vec<&'g ConfigNode>, LayerConfError> {
        let mut by_layer: BTreeMap<LayerId, &NodeName> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(names.len());

        for name in names {
            let node = graph.node_by_name(name)?;
            if let Some(first) = by_layer.insert(node.layer, &node.name) {
                return Err(LayerConfError::DuplicateLayer {
                    layer: node.layer,
                    first: first.clone(),
                    second: node.name.clone(),
                });
            }
            nodes.push(node);
        }

        Ok(nodes)
    }

    fn roll_back(
        &mut self,
        graph: &GraphStore,
        rejected: &ConfigNode,
        selected: &[&ConfigNode],
    ) -> LayerConfError {
        let selected: Vec<NodeName> = selected.iter().map(|node| node.name.clone()).collect();
        tracing::info!(
            rejected = %rejected.name,
            ?selected,
            "incompatible selection, rolled back"
        );
        self.committed = Committed::empty(graph);
        LayerConfError::IncompatibleSelection {
            name: rejected.name.clone(),
            selected,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
