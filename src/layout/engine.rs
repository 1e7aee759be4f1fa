//! Depth-grouped tree layout for flow graphs
//!
//! Builds a petgraph DiGraph from the flow, walks every root breadth-first
//! and places nodes left to right by depth. Trees are stacked vertically and
//! nodes no root reaches go in a trailing row.

use crate::config::LayoutConfig;
use crate::flow::graph::FlowGraph;
use crate::flow::types::Position;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Computes non-overlapping positions for every node of a flow
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

/// Internal representation of a flow as a petgraph graph
struct LayoutGraph<'a> {
    graph: DiGraph<&'a str, ()>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for the nodes of `flow`
    ///
    /// Pure and deterministic. Every node of the flow gets a position; callers
    /// merge the map over existing positions with `FlowGraph::apply_positions`.
    pub fn layout(&self, flow: &FlowGraph) -> HashMap<String, Position> {
        let LayoutGraph { graph } = build_layout_graph(flow);
        let cfg = &self.config;
        let column = cfg.node_width + cfg.horizontal_gap;
        let row = cfg.node_height + cfg.vertical_gap;

        let mut positions = HashMap::with_capacity(graph.node_count());
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut current_y = cfg.start_y;

        // A root has outgoing edges but no incoming ones. A node with several
        // parents is placed once, at the depth where the walk first reaches it.
        let roots: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| {
                graph.neighbors_directed(idx, Direction::Incoming).next().is_none()
                    && graph.neighbors_directed(idx, Direction::Outgoing).next().is_some()
            })
            .collect();

        for root in roots {
            if visited.contains(&root) {
                continue;
            }
            let depth_nodes = bucket_by_depth(&graph, root, &mut visited);
            let max_nodes_at_depth = depth_nodes.iter().map(Vec::len).max().unwrap_or(1);

            for (depth, bucket) in depth_nodes.iter().enumerate() {
                // Center each column against the tallest one in this tree
                let offset = (max_nodes_at_depth - bucket.len()) as f64 * row / 2.0;
                for (slot, &idx) in bucket.iter().enumerate() {
                    positions.insert(
                        graph[idx].to_string(),
                        Position::new(
                            cfg.start_x + depth as f64 * column,
                            current_y + offset + slot as f64 * row,
                        ),
                    );
                }
            }

            let tree_height = max_nodes_at_depth as f64 * row - cfg.vertical_gap;
            current_y += tree_height + 2.0 * cfg.vertical_gap;
            tracing::debug!(
                "🌳 Placed tree rooted at '{}' ({} levels, widest {})",
                graph[root],
                depth_nodes.len(),
                max_nodes_at_depth
            );
        }

        // Isolated nodes and nodes stranded on root-less cycles
        let mut orphans = 0usize;
        for idx in graph.node_indices() {
            if visited.contains(&idx) {
                continue;
            }
            positions.insert(
                graph[idx].to_string(),
                Position::new(cfg.start_x + orphans as f64 * column, current_y),
            );
            orphans += 1;
        }

        tracing::debug!("📐 Layout computed for {} nodes ({} orphans)", positions.len(), orphans);
        positions
    }
}

/// Breadth-first walk from `root`, grouping newly reached nodes by depth
///
/// `visited` is shared across roots, so a node reachable from two roots
/// belongs to the first tree that reaches it, and cycles terminate.
fn bucket_by_depth(
    graph: &DiGraph<&str, ()>,
    root: NodeIndex,
    visited: &mut HashSet<NodeIndex>,
) -> Vec<Vec<NodeIndex>> {
    let mut depth_nodes: Vec<Vec<NodeIndex>> = Vec::new();
    let mut queue = VecDeque::new();

    visited.insert(root);
    queue.push_back((root, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth_nodes.len() <= depth {
            depth_nodes.resize_with(depth + 1, Vec::new);
        }
        depth_nodes[depth].push(current);

        // petgraph yields neighbors newest edge first; walk in edge order
        let mut children: Vec<NodeIndex> = graph.neighbors_directed(current, Direction::Outgoing).collect();
        children.reverse();

        for child in children {
            if visited.insert(child) {
                queue.push_back((child, depth + 1));
            }
        }
    }

    depth_nodes
}

/// Build a petgraph DiGraph from the flow
///
/// Graph node indices follow flow insertion order. Edges whose endpoints are
/// missing are skipped.
fn build_layout_graph(flow: &FlowGraph) -> LayoutGraph<'_> {
    let mut graph = DiGraph::with_capacity(flow.len(), flow.edges().len());
    let mut node_id_to_index = HashMap::with_capacity(flow.len());

    for node in flow.nodes() {
        let idx = graph.add_node(node.id.as_str());
        node_id_to_index.insert(node.id.as_str(), idx);
    }

    for edge in flow.edges() {
        match (
            node_id_to_index.get(edge.source.as_str()),
            node_id_to_index.get(edge.target.as_str()),
        ) {
            (Some(&from), Some(&to)) => {
                graph.add_edge(from, to, ());
            }
            _ => tracing::debug!("⏭️ Skipping edge '{}' with a missing endpoint", edge.id),
        }
    }

    LayoutGraph { graph }
}
