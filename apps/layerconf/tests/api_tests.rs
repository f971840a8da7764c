//! Integration tests for the Layerconf HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use layerconf::api::{
    AppState, AppendResponse, ErrorResponse, HealthResponse, SelectionResponse, StatusResponse,
    create_router,
};
use layerconf_core::{
    ConfigNode, Document, GraphStore, LayerId, NodeName, NodeRecord, SelectionPhase, Session,
};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn doc(json: &str) -> Document {
    serde_json::from_str(json).unwrap()
}

/// det_a -> fast -> cal1, det_a -> slow -> cal2, det_b -> slow.
fn pipeline() -> GraphStore {
    GraphStore::build([
        ConfigNode::new("det_a", 0)
            .with_children(["fast", "slow"])
            .with_parameters(doc(r#"{"detector": "A", "gain": 1, "trigger": {"level": 3}}"#)),
        ConfigNode::new("det_b", 0)
            .with_children(["slow"])
            .with_parameters(doc(r#"{"detector": "B", "gain": 1}"#)),
        ConfigNode::new("fast", 1)
            .with_parents(["det_a"])
            .with_children(["cal1"])
            .with_parameters(doc(r#"{"rate": 1000, "trigger": {"level": null, "mode": "edge"}}"#)),
        ConfigNode::new("slow", 1)
            .with_parents(["det_a", "det_b"])
            .with_children(["cal2"])
            .with_parameters(doc(r#"{"rate": 10}"#)),
        ConfigNode::new("cal1", 2)
            .with_parents(["fast"])
            .with_parameters(doc(r#"{"gain": 2}"#)),
        ConfigNode::new("cal2", 2)
            .with_parents(["slow"])
            .with_parameters(doc(r#"{"gain": 4}"#)),
    ])
    .unwrap()
}

/// Create a test server over the pipeline graph.
fn create_test_server() -> TestServer {
    let session = Session::from_graph(pipeline()).unwrap();
    TestServer::new(create_router(AppState::new(session))).unwrap()
}

/// Create a test server over an empty graph.
fn create_empty_test_server() -> TestServer {
    let session = Session::from_graph(GraphStore::default()).unwrap();
    TestServer::new(create_router(AppState::new(session))).unwrap()
}

fn layer<'a>(valid: &'a Value, id: &str) -> Vec<&'a str> {
    valid[id]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect()
}

// =============================================================================
// HEALTH / STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_counts_nodes_and_layers() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.node_count, 6);
    assert_eq!(status.layer_count, 3);
    assert_eq!(status.selected, 0);
    assert_eq!(status.phase, SelectionPhase::Empty);
}

#[tokio::test]
async fn test_status_empty_graph() {
    let server = create_empty_test_server();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.node_count, 0);
    assert_eq!(status.layer_count, 0);
}

#[tokio::test]
async fn test_options_grouped_by_layer() {
    let server = create_test_server();

    let response = server.get("/options").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(layer(&body["layers"], "0"), vec!["det_a", "det_b"]);
    assert_eq!(layer(&body["layers"], "2"), vec!["cal1", "cal2"]);
}

// =============================================================================
// NODE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_get_config_returns_record() {
    let server = create_test_server();

    let response = server.get("/configs/fast").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["Name"], "fast");
    assert_eq!(body["meta"]["layer"], 1);
    assert_eq!(body["parents"], json!(["det_a"]));
    assert_eq!(body["parameters"]["rate"], 1000);
}

#[tokio::test]
async fn test_get_unknown_config_is_not_found() {
    let server = create_test_server();

    let response = server.get("/configs/ghost").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("ghost"));
}

#[tokio::test]
async fn test_patch_config_replaces_top_level_keys() {
    let server = create_test_server();

    let response = server
        .put("/configs/cal1")
        .json(&json!({"gain": 7, "offset": 0.5}))
        .await;

    response.assert_status_ok();
    let record: NodeRecord = response.json();
    assert_eq!(
        record.parameters,
        doc(r#"{"gain": 7, "offset": 0.5}"#)
    );
}

#[tokio::test]
async fn test_patch_unknown_config_is_not_found() {
    let server = create_test_server();

    let response = server.put("/configs/ghost").json(&json!({"gain": 1})).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_append_config_warns_and_lists_node() {
    let server = create_test_server();

    let response = server
        .post("/configs")
        .json(&json!({"Name": "cal3", "meta": {"layer": 2}, "parameters": {"gain": 8}}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let appended: AppendResponse = response.json();
    assert_eq!(appended.node.name, "cal3");
    assert!(appended.warning.contains("cal3"));

    let options: Value = server.get("/options").await.json();
    assert_eq!(layer(&options["layers"], "2"), vec!["cal1", "cal2", "cal3"]);
}

#[tokio::test]
async fn test_append_duplicate_config_conflicts() {
    let server = create_test_server();

    let response = server
        .post("/configs")
        .json(&json!({"Name": "fast", "meta": {"layer": 1}}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_append_config_with_empty_name_rejected() {
    let server = create_test_server();

    let response = server
        .post("/configs")
        .json(&json!({"Name": "", "meta": {"layer": 1}}))
        .await;

    response.assert_status_bad_request();
}

// =============================================================================
// SELECTION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_put_selection_narrows_options() {
    let server = create_test_server();

    let response = server
        .put("/selection")
        .json(&json!({"names": ["det_b"]}))
        .await;

    response.assert_status_ok();
    let body: SelectionResponse = response.json();
    assert_eq!(body.selection.names(), [NodeName::new("det_b")]);
    assert_eq!(body.phase, SelectionPhase::Partial);
    assert!(body.valid_options.allows(LayerId(1), &NodeName::new("slow")));
    assert!(!body.valid_options.allows(LayerId(1), &NodeName::new("fast")));

    let valid: Value = server.get("/valid_options").await.json();
    assert_eq!(layer(&valid, "1"), vec!["slow"]);
    assert_eq!(layer(&valid, "2"), vec!["cal2"]);
}

#[tokio::test]
async fn test_put_full_path_completes() {
    let server = create_test_server();

    let response = server
        .put("/selection")
        .json(&json!({"names": ["cal1", "det_a", "fast"]}))
        .await;

    response.assert_status_ok();
    let body: SelectionResponse = response.json();
    assert_eq!(body.phase, SelectionPhase::Complete);
}

#[tokio::test]
async fn test_duplicate_layer_leaves_selection_unchanged() {
    let server = create_test_server();
    server
        .put("/selection")
        .json(&json!({"names": ["slow"]}))
        .await
        .assert_status_ok();

    let response = server
        .put("/selection")
        .json(&json!({"names": ["det_a", "det_b"]}))
        .await;

    response.assert_status_bad_request();
    let current: SelectionResponse = server.get("/selection").await.json();
    assert_eq!(current.selection.names(), [NodeName::new("slow")]);
}

#[tokio::test]
async fn test_unknown_name_in_selection_is_not_found() {
    let server = create_test_server();

    let response = server
        .put("/selection")
        .json(&json!({"names": ["det_a", "ghost"]}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let current: SelectionResponse = server.get("/selection").await.json();
    assert!(current.selection.is_empty());
}

#[tokio::test]
async fn test_incompatible_selection_rolls_back() {
    let server = create_test_server();
    server
        .put("/selection")
        .json(&json!({"names": ["det_b"]}))
        .await
        .assert_status_ok();

    let response = server
        .put("/selection")
        .json(&json!({"names": ["det_b", "fast"]}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("fast"));

    let current: SelectionResponse = server.get("/selection").await.json();
    assert!(current.selection.is_empty());
    assert_eq!(current.phase, SelectionPhase::Empty);
    assert!(current.valid_options.allows(LayerId(1), &NodeName::new("fast")));
}

#[tokio::test]
async fn test_delete_selection_resets() {
    let server = create_test_server();
    server
        .put("/selection")
        .json(&json!({"names": ["det_a", "fast"]}))
        .await
        .assert_status_ok();

    let response = server.delete("/selection").await;

    response.assert_status_ok();
    let body: SelectionResponse = response.json();
    assert!(body.selection.is_empty());

    let valid: Value = server.get("/valid_options").await.json();
    assert_eq!(layer(&valid, "0"), vec!["det_a", "det_b"]);
    assert_eq!(layer(&valid, "1"), vec!["fast", "slow"]);
}

// =============================================================================
// MERGE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_current_config_without_selection() {
    let server = create_test_server();

    let response = server.get("/current_config").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"status": "no_selection"}));
}

#[tokio::test]
async fn test_current_config_merges_in_layer_order() {
    let server = create_test_server();
    server
        .put("/selection")
        .json(&json!({"names": ["cal1", "fast", "det_a"]}))
        .await
        .assert_status_ok();

    let response = server.get("/current_config").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "merged");
    assert_eq!(
        body["config"],
        json!({
            "detector": "A",
            "gain": 2,
            "rate": 1000,
            "trigger": {"level": 3, "mode": "edge"}
        })
    );
}

#[tokio::test]
async fn test_patched_parameters_reach_current_config() {
    let server = create_test_server();
    server
        .put("/configs/det_b")
        .json(&json!({"detector": "B2"}))
        .await
        .assert_status_ok();
    server
        .put("/selection")
        .json(&json!({"names": ["det_b"]}))
        .await
        .assert_status_ok();

    let body: Value = server.get("/current_config").await.json();
    assert_eq!(body["config"]["detector"], "B2");
    assert_eq!(body["config"]["gain"], 1);
}
