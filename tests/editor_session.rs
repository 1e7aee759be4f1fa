//! End-to-end editing session: pick a trigger from the catalog, build a
//! flow, validate it, rearrange it and hand it to storage.

use flowkit::catalog::{loader_fn, TriggerCatalog, TriggerCatalogEntry};
use flowkit::config::{CacheConfig, LayoutConfig};
use flowkit::flow::{is_save_eligible, validate, FlowDocument, FlowGraph, NodeKind, NodeVariant, Position};
use flowkit::layout::LayoutEngine;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn layout_config() -> LayoutConfig {
    LayoutConfig {
        node_width: 240.0,
        node_height: 120.0,
        horizontal_gap: 60.0,
        vertical_gap: 40.0,
        start_x: 50.0,
        start_y: 50.0,
    }
}

fn catalog(calls: Arc<AtomicUsize>) -> TriggerCatalog {
    let mut aliases = HashMap::new();
    aliases.insert("ig".to_string(), "instagram".to_string());
    let config = CacheConfig {
        min_interval: Duration::from_millis(500),
        warn_after_calls: 50,
        max_calls: 500,
        aliases,
    };

    TriggerCatalog::new(
        &config,
        loader_fn(move |channel: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok::<_, anyhow::Error>(vec![
                    TriggerCatalogEntry {
                        id: "keyword_dm".to_string(),
                        name: "Keyword DM".to_string(),
                        icon: "💬".to_string(),
                        description: format!("Keyword in a {} DM", channel),
                    },
                    TriggerCatalogEntry {
                        id: "keyword_comment".to_string(),
                        name: "Keyword Comment".to_string(),
                        icon: "🗨️".to_string(),
                        description: String::new(),
                    },
                ])
            }
        }),
    )
}

#[tokio::test]
async fn test_editing_session() {
    let calls = Arc::new(AtomicUsize::new(0));
    let catalog = catalog(Arc::clone(&calls));

    // Node picker opens: nothing cached yet, then the catalog arrives once
    assert!(catalog.get_cached("instagram").is_none());
    let (first, second) = tokio::join!(catalog.get("instagram"), catalog.get("ig"));
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let picked = &first[0];
    let mut graph = FlowGraph::new();
    let trigger = graph
        .add_node(NodeVariant::from_parts(NodeKind::Trigger, &picked.id), Map::new(), Position::default())
        .id
        .clone();
    let reply = graph
        .add_node(NodeVariant::SendMessage, Map::new(), Position::default())
        .id
        .clone();
    let image = graph
        .add_node(NodeVariant::SendImage, Map::new(), Position::default())
        .id
        .clone();
    let note = graph
        .add_node(NodeVariant::Condition("has_tag".to_string()), Map::new(), Position::new(900.0, 900.0))
        .id
        .clone();
    graph.connect(&trigger, &reply, None).unwrap();
    graph.connect(&reply, &image, None).unwrap();

    // Empty defaults block saving
    let issues = validate(&graph);
    let flagged: Vec<&str> = issues.iter().map(|issue| issue.node_id.as_str()).collect();
    assert_eq!(flagged, vec![trigger.as_str(), reply.as_str(), image.as_str()]);
    assert!(issues[0].messages.contains(&"Keyword is required".to_string()));
    assert!(!is_save_eligible(&issues));

    graph.update_node_data(&trigger, fields(json!({ "keyword": "hello" })));
    graph.update_node_data(&reply, fields(json!({ "message": "Thanks for reaching out!" })));
    graph.update_node_data(&image, fields(json!({ "imageUrl": "https://cdn.example/welcome.png" })));
    assert!(is_save_eligible(&validate(&graph)));

    graph.rearrange(&LayoutEngine::new(layout_config()));
    assert_eq!(graph.position_of(&trigger), Some(Position::new(50.0, 50.0)));
    assert_eq!(graph.position_of(&reply), Some(Position::new(350.0, 50.0)));
    assert_eq!(graph.position_of(&image), Some(Position::new(650.0, 50.0)));
    assert_eq!(graph.position_of(&note), Some(Position::new(50.0, 250.0)));

    // Removing the middle step drops both of its edges
    graph.delete_node(&reply);
    assert!(graph.edges().is_empty());

    let document: FlowDocument = graph.to_document("Welcome", vec!["onboarding".to_string()]);
    let stored = serde_json::to_value(&document).unwrap();
    assert_eq!(stored["nodes"][0]["kind"], "trigger");
    assert_eq!(stored["nodes"][0]["subtype"], "keyword_dm");
    assert_eq!(stored["categories"][0], "onboarding");

    let restored = FlowGraph::from_document(serde_json::from_value(stored).unwrap()).unwrap();
    assert_eq!(restored.nodes(), graph.nodes());
}

#[test]
fn test_hydration_rejects_dangling_edges() {
    let document: FlowDocument = serde_json::from_value(json!({
        "name": "Broken",
        "nodes": [
            { "id": "a", "kind": "trigger", "subtype": "keyword_dm", "data": { "keyword": "hi" } }
        ],
        "edges": [
            { "id": "e1", "source": "a", "target": "b" }
        ]
    }))
    .unwrap();

    let err = FlowGraph::from_document(document).unwrap_err();
    assert!(err.is_reference_error());
}
