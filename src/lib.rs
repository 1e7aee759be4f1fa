//! flowkit: the core of a messaging-automation flow editor
//!
//! Holds the flow graph model with its validator, the auto-layout engine and
//! the trigger catalog cache. Rendering, storage and message delivery belong
//! to the surrounding application.

// Configuration from environment variables
pub mod config;

// Library error type
pub mod error;

// Flow graph model - nodes, edges, mutations and validation
pub mod flow;

// Depth-grouped auto-layout
pub mod layout;

// Trigger catalog loading and caching
pub mod catalog;

// Re-export commonly used types for external consumers
pub use catalog::{ResourceCache, ResourceLoader, TriggerCatalog, TriggerCatalogEntry};
pub use config::Config;
pub use error::{FlowError, Result};
pub use flow::{validate, Edge, FlowDocument, FlowGraph, Node, NodeKind, NodeVariant, Position, ValidationIssue};
pub use layout::LayoutEngine;
