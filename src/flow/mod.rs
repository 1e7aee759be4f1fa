//! Flow graph model
//!
//! - Type definitions (Node, NodeVariant, Edge, FlowDocument)
//! - In-memory graph with referential integrity
//! - Required-field validation

pub mod types;

pub mod graph;

pub mod validator;

pub use graph::FlowGraph;
pub use types::{Edge, FlowDocument, Node, NodeKind, NodeVariant, Position};
pub use validator::{is_save_eligible, validate, ValidationIssue};
