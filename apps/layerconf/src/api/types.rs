//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use layerconf_core::{
    LayerConfError, LayerId, NodeName, NodeRecord, Selection, SelectionPhase, ValidOptions,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Graph and selection status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node_count: usize,
    pub layer_count: usize,
    pub selected: usize,
    pub phase: SelectionPhase,
}

// =============================================================================
// OPTIONS RESPONSE
// =============================================================================

/// Every option grouped by layer, regardless of selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub layers: BTreeMap<LayerId, Vec<NodeName>>,
}

// =============================================================================
// NODE APPEND RESPONSE
// =============================================================================

/// Result of `POST /configs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendResponse {
    pub node: NodeRecord,
    /// The appended node has no ancestry until the graph is rebuilt.
    pub warning: String,
}

// =============================================================================
// SELECTION REQUEST/RESPONSE
// =============================================================================

/// Body of `PUT /selection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub names: Vec<NodeName>,
}

/// Committed selection with its valid options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub selection: Selection,
    pub phase: SelectionPhase,
    pub valid_options: ValidOptions,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Engine error carried to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub LayerConfError);

impl ApiError {
    /// HTTP status for the wrapped error kind.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            LayerConfError::UnknownName(_) => StatusCode::NOT_FOUND,
            LayerConfError::DuplicateLayer { .. } | LayerConfError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            LayerConfError::IncompatibleSelection { .. } | LayerConfError::DuplicateName(_) => {
                StatusCode::CONFLICT
            }
            LayerConfError::LockPoisoned(_)
            | LayerConfError::SerializationError(_)
            | LayerConfError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LayerConfError> for ApiError {
    fn from(error: LayerConfError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "request rejected");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
