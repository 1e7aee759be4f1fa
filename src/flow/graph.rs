//! In-memory flow graph with referential integrity
//!
//! Owns the node and edge collections for one editing session. Nodes keep
//! insertion order (display order). Every edge endpoint always refers to a
//! node in the graph.

use crate::error::{FlowError, Result};
use crate::flow::types::{Edge, FlowDocument, Node, NodeVariant, Position};
use crate::layout::LayoutEngine;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate a graph from a stored document
    pub fn from_document(document: FlowDocument) -> Result<Self> {
        let mut graph = Self::new();
        graph.add_nodes(document.nodes, document.edges)?;
        Ok(graph)
    }

    /// Produce the storage shape for this graph
    pub fn to_document(&self, name: impl Into<String>, categories: Vec<String>) -> FlowDocument {
        FlowDocument {
            name: name.into(),
            categories,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    /// Edges ending at `node_id`
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == node_id)
    }

    /// Edges leaving `node_id`
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == node_id)
    }

    /// Add a node with a fresh id
    ///
    /// The variant's default data is applied first, then `data` is merged over
    /// it, so callers only pass the fields they want to override.
    pub fn add_node(&mut self, variant: NodeVariant, data: Map<String, Value>, position: Position) -> &Node {
        let mut merged = variant.default_data();
        merged.extend(data);

        let node = Node {
            id: format!("{}-{}", variant.kind().as_str(), Uuid::new_v4()),
            variant,
            data: merged,
            position,
        };

        tracing::debug!("➕ Added node '{}' ({}/{})", node.id, node.kind().as_str(), node.variant.subtype());
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// Bulk insert nodes and edges, e.g. when hydrating from storage
    ///
    /// Ids are taken as given. The whole batch is rejected, leaving the graph
    /// unchanged, if a node or edge id is already taken or an edge endpoint
    /// is missing.
    pub fn add_nodes(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<()> {
        let mut ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(FlowError::DuplicateNode { id: node.id.clone() });
            }
        }

        let mut edge_ids: HashSet<&str> = self.edges.iter().map(|edge| edge.id.as_str()).collect();
        for edge in &edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(FlowError::DuplicateEdge { id: edge.id.clone() });
            }
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(FlowError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        tracing::debug!("📦 Bulk inserting {} nodes and {} edges", nodes.len(), edges.len());
        self.nodes.extend(nodes);
        self.edges.extend(edges);
        Ok(())
    }

    /// Connect two existing nodes
    ///
    /// Fan-out is unbounded: a source (and handle) may feed any number of
    /// edges.
    pub fn connect(&mut self, source_id: &str, target_id: &str, source_handle: Option<&str>) -> Result<&Edge> {
        for endpoint in [source_id, target_id] {
            if !self.contains(endpoint) {
                return Err(FlowError::unknown_node(endpoint));
            }
        }

        let edge = Edge {
            id: format!("edge-{}", Uuid::new_v4()),
            source: source_id.to_string(),
            target: target_id.to_string(),
            source_handle: source_handle.map(str::to_string),
        };

        tracing::debug!("🔗 Connected '{}' → '{}' (handle: {:?})", edge.source, edge.target, edge.source_handle);
        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Shallow-merge `partial` into a node's data
    ///
    /// Returns false, and changes nothing, when the node does not exist.
    pub fn update_node_data(&mut self, node_id: &str, partial: Map<String, Value>) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == node_id) {
            Some(node) => {
                node.data.extend(partial);
                true
            }
            None => {
                tracing::warn!("⚠️ Ignoring data update for unknown node: {}", node_id);
                false
            }
        }
    }

    /// Remove a node together with every edge touching it
    pub fn delete_node(&mut self, node_id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|node| node.id == node_id)?;
        let node = self.nodes.remove(index);

        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(node_id));

        tracing::debug!("🗑️ Deleted node '{}' and {} connected edges", node_id, before - self.edges.len());
        Some(node)
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|edge| edge.id == edge_id)?;
        Some(self.edges.remove(index))
    }

    pub fn position_of(&self, node_id: &str) -> Option<Position> {
        self.node(node_id).map(|node| node.position)
    }

    /// Write back positions without touching any other node field
    ///
    /// Unknown ids are ignored; nodes missing from `positions` keep theirs.
    /// Returns how many nodes were moved.
    pub fn apply_positions(&mut self, positions: &HashMap<String, Position>) -> usize {
        let mut moved = 0;
        for node in &mut self.nodes {
            if let Some(position) = positions.get(&node.id) {
                node.position = *position;
                moved += 1;
            }
        }
        moved
    }

    /// Lay the graph out and merge the result over the current positions
    pub fn rearrange(&mut self, engine: &LayoutEngine) -> usize {
        let positions = engine.layout(self);
        let moved = self.apply_positions(&positions);
        tracing::info!("📐 Rearranged {} of {} nodes", moved, self.nodes.len());
        moved
    }
}
