//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::AppConfig;
use layerconf_core::{
    GraphStore, LayerConfError, NodeName, Session, load_graph, records_from_json,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a records file (100 MB).
const MAX_RECORDS_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LayerConfError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LayerConfError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LayerConfError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve a path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LayerConfError> {
    let canonical = path.canonicalize().map_err(|e| {
        LayerConfError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LayerConfError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// GRAPH LOADING
// =============================================================================

/// Build the graph from the configured records file.
///
/// Without a records file the graph is empty.
pub fn load_configured_graph(config: &AppConfig) -> Result<GraphStore, LayerConfError> {
    let Some(path) = config.graph.records.as_deref() else {
        tracing::warn!("No records file configured, starting with an empty graph");
        return Ok(GraphStore::default());
    };

    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_RECORDS_FILE_SIZE)?;

    let bytes = std::fs::read(&path)
        .map_err(|e| LayerConfError::IoError(format!("Cannot read records: {}", e)))?;
    let records = records_from_json(&bytes)?;
    tracing::info!(path = %path.display(), records = records.len(), "records loaded");

    load_graph(records)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), LayerConfError> {
    let graph = load_configured_graph(config)?;
    let summary = graph.summary();
    let session = Session::from_graph(graph)?;

    println!("Layerconf Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:    {}", config.server.host);
    println!("  Port:    {}", config.server.port);
    println!("  Records: {:?}", config.graph.records);
    println!("  Nodes:   {} in {} layers", summary.node_count, summary.layer_count);
    println!();
    println!("Endpoints:");
    println!("  GET    /options        - All options by layer");
    println!("  PUT    /selection      - Replace the selection");
    println!("  DELETE /selection      - Clear the selection");
    println!("  GET    /valid_options  - Options valid under the selection");
    println!("  GET    /current_config - Merged configuration");
    println!("  GET    /health         - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.server.addr(), session).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), LayerConfError> {
    let graph = load_configured_graph(config)?;
    let summary = graph.summary();
    let cyclic: Vec<&str> = graph.cyclic_nodes().into_iter().map(NodeName::as_str).collect();

    if json_mode {
        let output = serde_json::json!({
            "records": config.graph.records,
            "node_count": summary.node_count,
            "layer_count": summary.layer_count,
            "layers": summary.names_by_layer,
            "cyclic_nodes": cyclic,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Layerconf Graph Status");
    println!("======================");
    println!("Records: {:?}", config.graph.records);
    println!();
    println!("Nodes:  {}", summary.node_count);
    println!("Layers: {}", summary.layer_count);
    for (layer, names) in &summary.names_by_layer {
        let names: Vec<&str> = names.iter().map(NodeName::as_str).collect();
        println!("  Layer {}: {}", layer, names.join(", "));
    }
    if !cyclic.is_empty() {
        println!();
        println!("Cyclic: {}", cyclic.join(", "));
    }

    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Apply a selection and print valid options and the merged configuration.
pub fn cmd_resolve(
    config: &AppConfig,
    json_mode: bool,
    names: &[String],
) -> Result<(), LayerConfError> {
    let mut session = Session::from_graph(load_configured_graph(config)?)?;

    let names: Vec<NodeName> = names.iter().map(|n| NodeName::new(n.as_str())).collect();
    let valid = session.set_selection(&names)?;
    let phase = session.phase()?;
    let merged = session.merged_config()?;

    if json_mode {
        let output = serde_json::json!({
            "selection": session.current_selection(),
            "phase": phase,
            "valid_options": valid,
            "merged": merged,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    let selected: Vec<&str> = session
        .current_selection()
        .names()
        .iter()
        .map(NodeName::as_str)
        .collect();

    println!("Selection: [{}] ({:?})", selected.join(", "), phase);
    println!();
    println!("Valid options:");
    for (layer, options) in valid.iter() {
        let options: Vec<&str> = options.iter().map(NodeName::as_str).collect();
        println!("  Layer {}: {}", layer, options.join(", "));
    }
    println!();
    println!("Merged configuration:");
    println!(
        "{}",
        serde_json::to_string_pretty(&merged.to_display_document()).unwrap_or_default()
    );

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
