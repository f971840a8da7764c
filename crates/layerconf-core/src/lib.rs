//! # layerconf-core
//!
//! The layered configuration engine - THE LOGIC.
//!
//! Configuration options ("nodes") each belong to one ordered layer and are
//! linked by parent/child compatibility edges. A user picks at most one node
//! per layer; the engine keeps the remaining options consistent with every
//! pick and merges the picked nodes' parameters, higher layers overriding
//! lower ones.
//!
//! ## Components
//!
//! - `graph`: node registry with transitive ancestor/descendant closures
//! - `selection`: per-session selection and option narrowing with rollback
//! - `merge`: ordered recursive merge of parameter documents
//! - `session`: a selection bound to a graph shared between sessions
//! - `loader`: raw store records to nodes
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network, NO storage I/O: records arrive materialized
//! - Deterministic ordering everywhere (`BTreeMap`/`BTreeSet`)
//! - Never panics; every failure is a `LayerConfError`

// =============================================================================
// MODULES
// =============================================================================

pub mod graph;
pub mod loader;
pub mod merge;
pub mod primitives;
pub mod selection;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ConfigNode, Document, LayerConfError, LayerId, NodeName};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use graph::{AncestryClosure, GraphStore, GraphSummary, LayeredIndex, StaleClosureWarning};
pub use loader::{NodeRecord, RecordMeta, load_graph, records_from_json};
pub use merge::{MergeEngine, MergedConfig};
pub use selection::{Selection, SelectionEngine, SelectionPhase, ValidOptions};
pub use session::{Session, SharedGraph, share};
