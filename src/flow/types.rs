//! Core flow type definitions
//!
//! Nodes, edges and the persisted flow document. A node's behaviour is the
//! closed `NodeVariant` tag; its `data` stays a JSON object owned by the
//! editor so partial updates can be merged shallowly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Top-level node category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Condition,
    Action,
    Ai,
    Media,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
            NodeKind::Ai => "ai",
            NodeKind::Media => "media",
        }
    }
}

/// Concrete node behaviour, one variant per `(kind, subtype)` pair
///
/// Subtypes without field rules are carried by the catch-all variant of
/// their kind. Trigger catalogs are fetched per channel, so the set of
/// trigger subtypes a flow may contain is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "VariantParts", into = "VariantParts")]
pub enum NodeVariant {
    /// Trigger on a direct message containing a keyword
    KeywordDm,
    /// Trigger on a comment containing a keyword under a given post
    KeywordComment,
    OtherTrigger(String),
    Condition(String),
    /// Send a text message
    SendMessage,
    /// Ask the contact a question and store the answer in a field
    DataCollection,
    /// Wait before continuing
    Delay,
    OtherAction(String),
    /// Any AI step (reply, decision, ...), all of which need a prompt
    Ai(String),
    /// Media message with optional per-button output ports
    MediaMessage,
    SendImage,
    SendVideo,
    SendVoice,
    OtherMedia(String),
}

/// Flat `kind` + `subtype` wire form of a `NodeVariant`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VariantParts {
    kind: NodeKind,
    subtype: String,
}

impl From<VariantParts> for NodeVariant {
    fn from(parts: VariantParts) -> Self {
        NodeVariant::from_parts(parts.kind, &parts.subtype)
    }
}

impl From<NodeVariant> for VariantParts {
    fn from(variant: NodeVariant) -> Self {
        VariantParts {
            kind: variant.kind(),
            subtype: variant.subtype().to_string(),
        }
    }
}

impl NodeVariant {
    /// Resolve a `(kind, subtype)` pair. Total: unknown subtypes map to the
    /// catch-all variant of their kind.
    pub fn from_parts(kind: NodeKind, subtype: &str) -> Self {
        match (kind, subtype) {
            (NodeKind::Trigger, "keyword_dm") => NodeVariant::KeywordDm,
            (NodeKind::Trigger, "keyword_comment") => NodeVariant::KeywordComment,
            (NodeKind::Trigger, other) => NodeVariant::OtherTrigger(other.to_string()),
            (NodeKind::Condition, other) => NodeVariant::Condition(other.to_string()),
            (NodeKind::Action, "send_message") => NodeVariant::SendMessage,
            (NodeKind::Action, "data_collection") => NodeVariant::DataCollection,
            (NodeKind::Action, "delay") => NodeVariant::Delay,
            (NodeKind::Action, other) => NodeVariant::OtherAction(other.to_string()),
            (NodeKind::Ai, other) => NodeVariant::Ai(other.to_string()),
            (NodeKind::Media, "send_message") => NodeVariant::MediaMessage,
            (NodeKind::Media, "send_image") => NodeVariant::SendImage,
            (NodeKind::Media, "send_video") => NodeVariant::SendVideo,
            (NodeKind::Media, "send_voice") => NodeVariant::SendVoice,
            (NodeKind::Media, other) => NodeVariant::OtherMedia(other.to_string()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeVariant::KeywordDm | NodeVariant::KeywordComment | NodeVariant::OtherTrigger(_) => {
                NodeKind::Trigger
            }
            NodeVariant::Condition(_) => NodeKind::Condition,
            NodeVariant::SendMessage
            | NodeVariant::DataCollection
            | NodeVariant::Delay
            | NodeVariant::OtherAction(_) => NodeKind::Action,
            NodeVariant::Ai(_) => NodeKind::Ai,
            NodeVariant::MediaMessage
            | NodeVariant::SendImage
            | NodeVariant::SendVideo
            | NodeVariant::SendVoice
            | NodeVariant::OtherMedia(_) => NodeKind::Media,
        }
    }

    pub fn subtype(&self) -> &str {
        match self {
            NodeVariant::KeywordDm => "keyword_dm",
            NodeVariant::KeywordComment => "keyword_comment",
            NodeVariant::SendMessage | NodeVariant::MediaMessage => "send_message",
            NodeVariant::DataCollection => "data_collection",
            NodeVariant::Delay => "delay",
            NodeVariant::SendImage => "send_image",
            NodeVariant::SendVideo => "send_video",
            NodeVariant::SendVoice => "send_voice",
            NodeVariant::OtherTrigger(s)
            | NodeVariant::Condition(s)
            | NodeVariant::OtherAction(s)
            | NodeVariant::Ai(s)
            | NodeVariant::OtherMedia(s) => s,
        }
    }

    /// Human-readable name, used as the default node label
    pub fn display_name(&self) -> String {
        match self {
            NodeVariant::KeywordDm => "Keyword DM".to_string(),
            NodeVariant::KeywordComment => "Keyword Comment".to_string(),
            NodeVariant::SendMessage => "Send Message".to_string(),
            NodeVariant::DataCollection => "Data Collection".to_string(),
            NodeVariant::Delay => "Delay".to_string(),
            NodeVariant::MediaMessage => "Message".to_string(),
            NodeVariant::SendImage => "Send Image".to_string(),
            NodeVariant::SendVideo => "Send Video".to_string(),
            NodeVariant::SendVoice => "Send Voice".to_string(),
            NodeVariant::Ai(s) if s == "ai_decision" => "AI Decision".to_string(),
            other => title_case(other.subtype()),
        }
    }

    /// Data fields a freshly added node of this variant starts with
    pub fn default_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("label".to_string(), Value::String(self.display_name()));

        let defaults = match self {
            NodeVariant::KeywordDm => json!({ "keyword": "" }),
            NodeVariant::KeywordComment => json!({ "keyword": "", "postId": null }),
            NodeVariant::SendMessage => json!({ "message": "" }),
            NodeVariant::DataCollection => json!({ "prompt": "", "fieldName": "" }),
            NodeVariant::Delay => json!({ "delay": 1, "delayUnit": "minutes" }),
            NodeVariant::Ai(s) if s == "ai_decision" => json!({
                "prompt": "",
                "routes": [
                    { "id": "route1", "label": "Route 1" },
                    { "id": "route2", "label": "Route 2" }
                ]
            }),
            NodeVariant::Ai(_) => json!({ "prompt": "" }),
            NodeVariant::MediaMessage => json!({ "message": "", "buttons": [] }),
            NodeVariant::SendImage => json!({ "imageUrl": "", "caption": "" }),
            NodeVariant::SendVideo => json!({ "videoUrl": "", "caption": "" }),
            NodeVariant::SendVoice => json!({ "voiceUrl": "" }),
            NodeVariant::OtherTrigger(_)
            | NodeVariant::Condition(_)
            | NodeVariant::OtherAction(_)
            | NodeVariant::OtherMedia(_) => json!({}),
        };

        if let Value::Object(fields) = defaults {
            data.extend(fields);
        }
        data
    }
}

fn title_case(subtype: &str) -> String {
    subtype
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canvas coordinates of a node's top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single step in an automation flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within the flow, e.g. "trigger-6f1c..."
    pub id: String,
    /// Persisted as flat `kind` and `subtype` fields
    #[serde(flatten)]
    pub variant: NodeVariant,
    /// Subtype-specific fields edited through the node's form
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub position: Position,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.variant.kind()
    }

    /// The node's `label` field, or the variant's display name when unset
    pub fn label(&self) -> String {
        self.data
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.variant.display_name())
    }
}

/// Directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
    /// Named output port on the source, e.g. "route1" or a button id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
}

impl Edge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Shape exchanged with the flow storage service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowDocument {
    /// Parse a stored flow document
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
