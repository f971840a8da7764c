//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//! Each handler holds the session lock for the whole engine call, so a
//! narrowing/rollback sequence is never interleaved with another request.

use super::{
    AppState,
    types::{
        ApiResult, AppendResponse, HealthResponse, OptionsResponse, SelectionRequest,
        SelectionResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use layerconf_core::{
    Document, MergedConfig, NodeName, NodeRecord, Session, ValidOptions,
};
use std::collections::BTreeMap;

fn selection_response(session: &Session) -> ApiResult<SelectionResponse> {
    Ok(SelectionResponse {
        selection: session.current_selection().clone(),
        phase: session.phase()?,
        valid_options: session.valid_options().clone(),
    })
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS / OPTIONS HANDLERS
// =============================================================================

/// Graph counts and selection phase.
pub async fn status_handler(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let session = state.session.lock().await;
    let summary = session.summary()?;

    Ok(Json(StatusResponse {
        node_count: summary.node_count,
        layer_count: summary.layer_count,
        selected: session.current_selection().len(),
        phase: session.phase()?,
    }))
}

/// Every option by layer, ignoring the selection.
pub async fn options_handler(State(state): State<AppState>) -> ApiResult<Json<OptionsResponse>> {
    let session = state.session.lock().await;
    let summary = session.summary()?;

    Ok(Json(OptionsResponse {
        layers: summary.names_by_layer,
    }))
}

// =============================================================================
// NODE HANDLERS
// =============================================================================

/// Fetch one node as a record.
pub async fn get_config_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<NodeRecord>> {
    let session = state.session.lock().await;
    let node = session.node(&NodeName(name))?;
    Ok(Json(NodeRecord::from(&node)))
}

/// Replace top-level parameter keys of one node.
pub async fn patch_config_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(patch): Json<BTreeMap<String, Document>>,
) -> ApiResult<Json<NodeRecord>> {
    let session = state.session.lock().await;
    let node = session.patch_parameters(&NodeName(name), patch)?;
    Ok(Json(NodeRecord::from(&node)))
}

/// Append a node to the graph.
pub async fn append_config_handler(
    State(state): State<AppState>,
    Json(record): Json<NodeRecord>,
) -> ApiResult<(StatusCode, Json<AppendResponse>)> {
    let node = record.into_node()?;
    let session = state.session.lock().await;
    let warning = session.append_node(node.clone())?;

    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            node: NodeRecord::from(&node),
            warning: warning.to_string(),
        }),
    ))
}

// =============================================================================
// SELECTION HANDLERS
// =============================================================================

/// Current selection and its valid options.
pub async fn get_selection_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SelectionResponse>> {
    let session = state.session.lock().await;
    Ok(Json(selection_response(&session)?))
}

/// Replace the selection.
pub async fn put_selection_handler(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let mut session = state.session.lock().await;
    session.set_selection(&request.names)?;
    Ok(Json(selection_response(&session)?))
}

/// Clear the selection.
pub async fn delete_selection_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SelectionResponse>> {
    let mut session = state.session.lock().await;
    session.reset_selection()?;
    Ok(Json(selection_response(&session)?))
}

/// Valid options under the committed selection.
pub async fn valid_options_handler(State(state): State<AppState>) -> Json<ValidOptions> {
    let session = state.session.lock().await;
    Json(session.valid_options().clone())
}

// =============================================================================
// MERGE HANDLER
// =============================================================================

/// Merged parameters of the current selection.
pub async fn current_config_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<MergedConfig>> {
    let session = state.session.lock().await;
    Ok(Json(session.merged_config()?))
}
