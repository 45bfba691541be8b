use std::collections::HashSet;

use crate::graph_utils::graph::{EdgeId, NodeId, VisualGraph};

/// Selected and hovered elements. Hovering a node clears any hovered edge and
/// vice versa. Every id refers to an element of the loaded graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    // insertion order matters: Path mode uses the first two picks
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    hovered_node: Option<NodeId>,
    hovered_edge: Option<EdgeId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn selected_edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn hovered_node(&self) -> Option<NodeId> {
        self.hovered_node
    }

    pub fn hovered_edge(&self) -> Option<EdgeId> {
        self.hovered_edge
    }

    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn is_edge_selected(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Returns true when the hover target changed.
    pub fn set_hovered_node(&mut self, id: Option<NodeId>) -> bool {
        let changed = self.hovered_node != id || (id.is_some() && self.hovered_edge.is_some());
        self.hovered_node = id;
        if id.is_some() {
            self.hovered_edge = None;
        }
        changed
    }

    /// Returns true when the hover target changed.
    pub fn set_hovered_edge(&mut self, id: Option<EdgeId>) -> bool {
        let changed = self.hovered_edge != id || (id.is_some() && self.hovered_node.is_some());
        self.hovered_edge = id;
        if id.is_some() {
            self.hovered_node = None;
        }
        changed
    }

    pub fn clear_hover(&mut self) -> bool {
        let changed = self.hovered_node.is_some() || self.hovered_edge.is_some();
        self.hovered_node = None;
        self.hovered_edge = None;
        changed
    }

    /// Replaces the selection with a single node.
    pub fn select_node(&mut self, id: NodeId) {
        self.nodes.clear();
        self.edges.clear();
        self.nodes.push(id);
    }

    pub fn add_node(&mut self, id: NodeId) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
    }

    pub fn toggle_node(&mut self, id: NodeId) {
        if let Some(pos) = self.nodes.iter().position(|n| *n == id) {
            self.nodes.remove(pos);
        } else {
            self.nodes.push(id);
        }
    }

    pub fn select_edge(&mut self, id: EdgeId) {
        self.nodes.clear();
        self.edges.clear();
        self.edges.push(id);
    }

    pub fn toggle_edge(&mut self, id: EdgeId) {
        if let Some(pos) = self.edges.iter().position(|e| *e == id) {
            self.edges.remove(pos);
        } else {
            self.edges.push(id);
        }
    }

    pub fn select_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.nodes.clear();
        self.edges.clear();
        for id in ids {
            self.add_node(id);
        }
    }

    /// Returns true if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.is_empty();
        self.nodes.clear();
        self.edges.clear();
        had
    }

    /// Drops ids that no longer resolve in `graph`. Returns true if the selection shrank.
    pub fn retain_loaded(&mut self, graph: &VisualGraph) -> bool {
        let before = (self.nodes.len(), self.edges.len());
        self.nodes.retain(|id| graph.contains_node(*id));
        self.edges.retain(|id| graph.edge(*id).is_some_and(|e| !graph.is_dangling(e)));
        if self.hovered_node.is_some_and(|id| !graph.contains_node(id)) {
            self.hovered_node = None;
        }
        if self.hovered_edge.is_some_and(|id| graph.edge(id).is_none_or(|e| graph.is_dangling(e))) {
            self.hovered_edge = None;
        }
        before != (self.nodes.len(), self.edges.len())
    }

    /// Mirrors selection and hover onto the per-element flags of the graph.
    pub fn apply_to(&self, graph: &mut VisualGraph) {
        let nodes: HashSet<NodeId> = self.nodes.iter().copied().collect();
        let edges: HashSet<EdgeId> = self.edges.iter().copied().collect();
        for n in graph.nodes_mut() {
            n.selected = nodes.contains(&n.id);
            n.hovered = self.hovered_node == Some(n.id);
        }
        for e in graph.edges_mut() {
            e.selected = edges.contains(&e.id);
        }
    }
}
