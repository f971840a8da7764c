//! # Merge Engine
//!
//! Folds per-layer parameter documents into one configuration.
//!
//! Documents are merged left to right in ascending layer order, so higher
//! layers override lower ones:
//!
//! ```text
//! ((L0 <- L1) <- L2) <- L3
//! ```
//!
//! At every depth, a null on the right keeps the left value, two mappings
//! merge key by key, and anything else on the right wins outright.

use crate::Document;
use crate::primitives::NO_SELECTION_MESSAGE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of merging the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "config", rename_all = "snake_case")]
pub enum MergedConfig {
    /// Nothing selected yet. Not an error.
    NoSelection,
    /// The merged document.
    Merged(Document),
}

impl MergedConfig {
    /// The merged document, if there is one.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::NoSelection => None,
            Self::Merged(doc) => Some(doc),
        }
    }

    /// Convert into the document, if there is one.
    #[must_use]
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::NoSelection => None,
            Self::Merged(doc) => Some(doc),
        }
    }

    /// The document, or the "select options" text when nothing is selected.
    #[must_use]
    pub fn to_display_document(&self) -> Document {
        match self {
            Self::NoSelection => Document::String(NO_SELECTION_MESSAGE.to_string()),
            Self::Merged(doc) => doc.clone(),
        }
    }
}

/// Stateless document merger.
pub struct MergeEngine;

impl MergeEngine {
    /// Left-fold documents that are already in ascending layer order.
    ///
    /// Unpopulated layers must be left out, not passed as empty documents.
    pub fn merge_layers<I>(ordered_docs: I) -> MergedConfig
    where
        I: IntoIterator<Item = Document>,
    {
        let mut docs = ordered_docs.into_iter();
        let Some(first) = docs.next() else {
            return MergedConfig::NoSelection;
        };
        MergedConfig::Merged(docs.fold(first, Self::recursive_merge))
    }

    /// Merge `right` over `left`.
    ///
    /// Missing keys are treated as null on that side.
    pub fn recursive_merge(left: Document, right: Document) -> Document {
        match (left, right) {
            (left, Document::Null) => left,
            (Document::Mapping(left), Document::Mapping(right)) => {
                Document::Mapping(Self::merge_mappings(left, right))
            }
            (_, right) => right,
        }
    }

    fn merge_mappings(
        mut left: BTreeMap<String, Document>,
        right: BTreeMap<String, Document>,
    ) -> BTreeMap<String, Document> {
        for (key, right_value) in right {
            let left_value = left.remove(&key).unwrap_or_default();
            left.insert(key, Self::recursive_merge(left_value, right_value));
        }
        left
    }
}

// =============================================================================
// TESTS
// =============================================================================
