//! Required-field validation for flow graphs
//!
//! Every node is checked against the rules of its variant. Failures are
//! returned as data so the save flow decides whether to block.

use crate::flow::graph::FlowGraph;
use crate::flow::types::{Node, NodeVariant};
use serde::Serialize;
use serde_json::Value;

/// All rule failures for a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub node_id: String,
    pub node_label: String,
    /// One message per failed rule, in rule order
    pub messages: Vec<String>,
    /// Data keys the failed rules refer to, parallel to `messages`
    pub fields: Vec<String>,
}

/// A single required-field rule
struct Rule {
    field: &'static str,
    message: &'static str,
    check: fn(Option<&Value>) -> bool,
}

const fn non_empty(field: &'static str, message: &'static str) -> Rule {
    Rule { field, message, check: is_non_empty }
}

const fn present(field: &'static str, message: &'static str) -> Rule {
    Rule { field, message, check: is_present }
}

const KEYWORD_DM: &[Rule] = &[non_empty("keyword", "Keyword is required")];
const KEYWORD_COMMENT: &[Rule] = &[
    non_empty("keyword", "Keyword is required"),
    present("postId", "Post is required (postId)"),
];
const SEND_MESSAGE: &[Rule] = &[non_empty("message", "Message is required")];
const DATA_COLLECTION: &[Rule] = &[
    non_empty("prompt", "Prompt is required"),
    non_empty("fieldName", "Field name is required (fieldName)"),
];
const DELAY: &[Rule] = &[present("delay", "Delay is required")];
const AI: &[Rule] = &[non_empty("prompt", "Prompt is required")];
const SEND_IMAGE: &[Rule] = &[non_empty("imageUrl", "Image URL is required (imageUrl)")];
const SEND_VIDEO: &[Rule] = &[non_empty("videoUrl", "Video URL is required (videoUrl)")];
const SEND_VOICE: &[Rule] = &[non_empty("voiceUrl", "Voice URL is required (voiceUrl)")];

/// Rules for a variant; total over the closed variant set
fn rules_for(variant: &NodeVariant) -> &'static [Rule] {
    match variant {
        NodeVariant::KeywordDm => KEYWORD_DM,
        NodeVariant::KeywordComment => KEYWORD_COMMENT,
        NodeVariant::SendMessage | NodeVariant::MediaMessage => SEND_MESSAGE,
        NodeVariant::DataCollection => DATA_COLLECTION,
        NodeVariant::Delay => DELAY,
        NodeVariant::Ai(_) => AI,
        NodeVariant::SendImage => SEND_IMAGE,
        NodeVariant::SendVideo => SEND_VIDEO,
        NodeVariant::SendVoice => SEND_VOICE,
        NodeVariant::OtherTrigger(_)
        | NodeVariant::Condition(_)
        | NodeVariant::OtherAction(_)
        | NodeVariant::OtherMedia(_) => &[],
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn is_non_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

/// Check one node, returning an issue when any rule fails
pub fn validate_node(node: &Node) -> Option<ValidationIssue> {
    let mut messages = Vec::new();
    let mut fields = Vec::new();

    for rule in rules_for(&node.variant) {
        if !(rule.check)(node.data.get(rule.field)) {
            messages.push(rule.message.to_string());
            fields.push(rule.field.to_string());
        }
    }

    if messages.is_empty() {
        return None;
    }

    Some(ValidationIssue {
        node_id: node.id.clone(),
        node_label: node.label(),
        messages,
        fields,
    })
}

/// Validate a whole graph
///
/// Issues follow node insertion order. Nodes without failures produce no
/// entry.
pub fn validate(graph: &FlowGraph) -> Vec<ValidationIssue> {
    let issues: Vec<ValidationIssue> = graph.nodes().iter().filter_map(validate_node).collect();
    if !issues.is_empty() {
        tracing::debug!("🔍 Validation found {} nodes with missing fields", issues.len());
    }
    issues
}

/// A graph may be saved when validation produced no issues
pub fn is_save_eligible(issues: &[ValidationIssue]) -> bool {
    issues.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::{NodeKind, Position};
    use serde_json::{json, Map};

    fn node(variant: NodeVariant, data: Value) -> Node {
        let mut fields = Map::new();
        if let Value::Object(map) = data {
            fields = map;
        }
        Node {
            id: format!("n-{}-{}", variant.kind().as_str(), variant.subtype()),
            variant,
            data: fields,
            position: Position::default(),
        }
    }

    fn complete_fixtures() -> Vec<Node> {
        vec![
            node(NodeVariant::KeywordDm, json!({ "keyword": "hello" })),
            node(NodeVariant::KeywordComment, json!({ "keyword": "promo", "postId": "1789" })),
            node(NodeVariant::SendMessage, json!({ "message": "Hi there" })),
            node(NodeVariant::DataCollection, json!({ "prompt": "Email?", "fieldName": "email" })),
            node(NodeVariant::Delay, json!({ "delay": 5 })),
            node(NodeVariant::Ai("ai_reply".to_string()), json!({ "prompt": "Be kind" })),
            node(NodeVariant::MediaMessage, json!({ "message": "Pick one" })),
            node(NodeVariant::SendImage, json!({ "imageUrl": "https://cdn/x.png" })),
            node(NodeVariant::SendVideo, json!({ "videoUrl": "https://cdn/x.mp4" })),
            node(NodeVariant::SendVoice, json!({ "voiceUrl": "https://cdn/x.ogg" })),
            node(NodeVariant::Condition("has_tag".to_string()), json!({})),
            node(NodeVariant::OtherTrigger("new_follower".to_string()), json!({})),
        ]
    }

    #[test]
    fn test_keyword_dm_requires_keyword() {
        let issue = validate_node(&node(NodeVariant::KeywordDm, json!({ "keyword": "" }))).unwrap();
        assert_eq!(issue.messages, vec!["Keyword is required".to_string()]);
        assert_eq!(issue.node_label, "Keyword DM");

        assert!(validate_node(&node(NodeVariant::KeywordDm, json!({ "keyword": "hello" }))).is_none());
    }

    #[test]
    fn test_whitespace_does_not_count() {
        assert!(validate_node(&node(NodeVariant::SendMessage, json!({ "message": "   " }))).is_some());
    }

    #[test]
    fn test_multiple_violations_collected_on_one_issue() {
        let issue = validate_node(&node(NodeVariant::KeywordComment, json!({}))).unwrap();
        assert_eq!(issue.fields, vec!["keyword".to_string(), "postId".to_string()]);
        assert_eq!(issue.messages.len(), 2);

        let issue = validate_node(&node(NodeVariant::DataCollection, json!({ "prompt": "" }))).unwrap();
        assert_eq!(issue.fields, vec!["prompt".to_string(), "fieldName".to_string()]);
    }

    #[test]
    fn test_every_rule_names_its_field() {
        for complete in complete_fixtures() {
            for rule in rules_for(&complete.variant) {
                let mut broken = complete.clone();
                broken.data.remove(rule.field);

                let issue = validate_node(&broken)
                    .unwrap_or_else(|| panic!("{} without {} passed", broken.variant.subtype(), rule.field));
                let index = issue.fields.iter().position(|f| f == rule.field).unwrap();

                let message = issue.messages[index].to_lowercase();
                let field = rule.field.to_lowercase();
                assert!(message.contains(&field), "'{}' does not name '{}'", message, rule.field);
            }
        }
    }

    #[test]
    fn test_complete_nodes_produce_no_issues() {
        let mut graph = FlowGraph::new();
        let fixtures = complete_fixtures();
        let count = fixtures.len();
        graph.add_nodes(fixtures, vec![]).unwrap();
        assert_eq!(graph.len(), count);

        let issues = validate(&graph);
        assert_eq!(issues, Vec::new());
        assert!(is_save_eligible(&issues));
    }

    #[test]
    fn test_issues_follow_insertion_order_and_leave_graph_untouched() {
        let mut graph = FlowGraph::new();
        graph.add_node(NodeVariant::SendVideo, Map::new(), Position::default());
        graph.add_node(NodeVariant::Ai("ai_decision".to_string()), Map::new(), Position::default());
        graph.add_node(NodeVariant::Delay, Map::new(), Position::default());
        let before = graph.nodes().to_vec();

        let issues = validate(&graph);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].node_id, graph.nodes()[0].id);
        assert_eq!(issues[1].node_id, graph.nodes()[1].id);
        assert_eq!(graph.nodes()[1].kind(), NodeKind::Ai);
        assert_eq!(validate(&graph), issues);
        assert_eq!(graph.nodes(), before.as_slice());
    }

    #[test]
    fn test_delay_accepts_zero() {
        assert!(validate_node(&node(NodeVariant::Delay, json!({ "delay": 0 }))).is_none());
        assert!(validate_node(&node(NodeVariant::Delay, json!({ "delay": null }))).is_some());
    }
}
