use std::collections::{HashMap, HashSet};

use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type EdgeId = Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Thought,
    Knowledge,
    Concept,
    Cluster,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Thought => "thought",
            NodeKind::Knowledge => "knowledge",
            NodeKind::Concept => "concept",
            NodeKind::Cluster => "cluster",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Circle,
    Rectangle,
    Diamond,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    #[default]
    Related,
    Semantic,
    Temporal,
    Causal,
    Reference,
    Supports,
    Contradicts,
    #[serde(other)]
    Other,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Related => "related",
            ConnectionKind::Semantic => "semantic",
            ConnectionKind::Temporal => "temporal",
            ConnectionKind::Causal => "causal",
            ConnectionKind::Reference => "reference",
            ConnectionKind::Supports => "supports",
            ConnectionKind::Contradicts => "contradicts",
            ConnectionKind::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashPattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl DashPattern {
    /// (dash, gap) lengths in screen pixels, `None` for a solid stroke.
    pub fn intervals(&self) -> Option<(f32, f32)> {
        match self {
            DashPattern::Solid => None,
            DashPattern::Dashed => Some((8.0, 4.0)),
            DashPattern::Dotted => Some((2.0, 3.0)),
        }
    }
}

/// Structural metrics carried over from the connection-discovery collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetrics {
    pub importance: f32,
    pub centrality: f32,
    pub degree: usize,
    // unix seconds
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
    pub id: NodeId,
    pub entity_id: Option<Uuid>,
    pub kind: NodeKind,
    pub label: String,
    pub content: String,
    pub position: Pos2,
    // false until a layout, warm start or drag gives the node a real position
    pub placed: bool,
    pub pinned: bool,
    pub radius: f32,
    pub shape: NodeShape,
    pub color: Color32,
    pub opacity: f32,
    pub z: u32,
    pub selected: bool,
    pub highlighted: bool,
    pub hovered: bool,
    pub metrics: NodeMetrics,
}

impl VisualNode {
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id,
            entity_id: None,
            kind,
            label: label.into(),
            content: String::new(),
            position: Pos2::ZERO,
            placed: false,
            pinned: false,
            radius: 10.0,
            shape: NodeShape::Circle,
            color: Color32::from_rgb(0x7b, 0xa3, 0xff),
            opacity: 1.0,
            z: 0,
            selected: false,
            highlighted: false,
            hovered: false,
            metrics: NodeMetrics::default(),
        }
    }

    pub fn at(mut self, position: Pos2) -> Self {
        self.position = position;
        self.placed = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
    // screen pixels, independent of zoom
    pub width: f32,
    pub color: Color32,
    // control point offset as a fraction of the chord length
    pub curvature: f32,
    pub arrow: bool,
    pub dash: DashPattern,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            width: 1.5,
            color: Color32::from_rgb(200, 200, 200),
            curvature: 0.0,
            arrow: true,
            dash: DashPattern::Solid,
        }
    }
}

/// Edges reference nodes by id only. An id that no longer resolves makes the
/// edge invisible and inert rather than invalid.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: ConnectionKind,
    pub strength: f32,
    pub confidence: f32,
    pub bidirectional: bool,
    pub style: EdgeStyle,
    pub opacity: f32,
    pub selected: bool,
    pub highlighted: bool,
}

impl VisualEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            kind: ConnectionKind::default(),
            strength: 1.0,
            confidence: 1.0,
            bidirectional: false,
            style: EdgeStyle::default(),
            opacity: 1.0,
            selected: false,
            highlighted: false,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Flat arena of nodes and edges with id indexes.
#[derive(Clone, Debug, Default)]
pub struct VisualGraph {
    nodes: Vec<VisualNode>,
    edges: Vec<VisualEdge>,
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<EdgeId, usize>,
}

impl VisualGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns false (and keeps the existing node) on a duplicate id
    pub fn add_node(&mut self, node: VisualNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        self.node_index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    // Endpoints are not checked here; dangling edges are tolerated
    pub fn add_edge(&mut self, edge: VisualEdge) -> bool {
        if self.edge_index.contains_key(&edge.id) {
            return false;
        }
        self.edge_index.insert(edge.id, self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&VisualNode> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut VisualNode> {
        match self.node_index.get(&id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn edge(&self, id: EdgeId) -> Option<&VisualEdge> {
        self.edge_index.get(&id).map(|&i| &self.edges[i])
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut VisualEdge> {
        match self.edge_index.get(&id) {
            Some(&i) => Some(&mut self.edges[i]),
            None => None,
        }
    }

    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [VisualNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[VisualEdge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [VisualEdge] {
        &mut self.edges
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes a node. Incident edges stay in the arena and become dangling.
    pub fn remove_node(&mut self, id: NodeId) -> Option<VisualNode> {
        let idx = self.node_index.remove(&id)?;
        let node = self.nodes.remove(idx);
        for (i, n) in self.nodes.iter().enumerate().skip(idx) {
            self.node_index.insert(n.id, i);
        }
        Some(node)
    }

    /// Both endpoints of an edge, or `None` when either is dangling.
    pub fn endpoints(&self, edge: &VisualEdge) -> Option<(&VisualNode, &VisualNode)> {
        Some((self.node(edge.source)?, self.node(edge.target)?))
    }

    pub fn is_dangling(&self, edge: &VisualEdge) -> bool {
        !(self.contains_node(edge.source) && self.contains_node(edge.target))
    }

    /// Distinct neighbors in first-seen edge order; self-loops and dangling ends are ignored.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut out = Vec::new();
        for e in &self.edges {
            if e.is_self_loop() || self.is_dangling(e) {
                continue;
            }
            let other = if e.source == id {
                e.target
            } else if e.target == id {
                e.source
            } else {
                continue;
            };
            if seen.insert(other) {
                out.push(other);
            }
        }
        out
    }

    /// Undirected degree per node counting every resolvable edge (multi-edges count, self-loops count twice).
    pub fn degrees(&self) -> HashMap<NodeId, usize> {
        let mut deg: HashMap<NodeId, usize> = self.nodes.iter().map(|n| (n.id, 0)).collect();
        for e in &self.edges {
            if self.is_dangling(e) {
                continue;
            }
            *deg.entry(e.source).or_insert(0) += 1;
            *deg.entry(e.target).or_insert(0) += 1;
        }
        deg
    }

    /// Node indexes sorted bottom-to-top for drawing; ties keep arena order.
    pub fn z_ordered(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| (self.nodes[i].z, i));
        order
    }

    pub fn bring_to_front(&mut self, id: NodeId) {
        let top = self.nodes.iter().map(|n| n.z).max().unwrap_or(0);
        if let Some(n) = self.node_mut(id)
            && (n.z < top || top == 0)
        {
            n.z = top + 1;
        }
    }

    pub fn translate_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        if let Some(n) = self.node_mut(id) {
            n.position += delta;
            n.placed = true;
            true
        } else {
            false
        }
    }

    /// World-space bounds of all nodes including their radius.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds_of(self.nodes.iter().map(|n| n.id))
    }

    pub fn bounds_of(&self, ids: impl IntoIterator<Item = NodeId>) -> Option<Rect> {
        let mut out = Rect::NOTHING;
        let mut any = false;
        for id in ids {
            if let Some(n) = self.node(id) {
                out = out.union(Rect::from_center_size(n.position, Vec2::splat(n.radius * 2.0)));
                any = true;
            }
        }
        any.then_some(out)
    }

    pub fn positions(&self) -> HashMap<NodeId, Pos2> {
        self.nodes.iter().map(|n| (n.id, n.position)).collect()
    }
}
