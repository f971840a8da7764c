//! # Fixed Limits
//!
//! Compile-time constants for the engine. They are immutable at runtime.

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for node names.
///
/// Records with longer names are rejected by the loader.
pub const MAX_NODE_NAME_LENGTH: usize = 256;

/// Maximum number of names in a single selection request.
///
/// A selection can never hold more names than there are layers; this bound
/// rejects absurd requests before any lookup happens.
pub const MAX_SELECTION_LENGTH: usize = 1024;

// =============================================================================
// SENTINELS
// =============================================================================

/// Human-readable form of the "no selection made" merge result.
pub const NO_SELECTION_MESSAGE: &str = "Select options to merge";
