//! Layout algorithms producing world positions from graph topology.
//!
//! Every algorithm is a pure function of `(nodes, edges, params, config)`. Only the
//! force-directed variant iterates; the others report a single, converged pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{NodeId, VisualGraph};

pub mod circular;
pub mod force;
pub mod hierarchical;
pub mod job;
pub mod quadtree;
pub mod radial;

pub use circular::CircularParams;
pub use force::ForceParams;
pub use hierarchical::{HierarchicalParams, Orientation};
pub use radial::RadialParams;

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    // None means "never placed": the force layout seeds it pseudo-randomly
    pub position: Option<Pos2>,
    pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub center: Pos2,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { center: Pos2::ZERO }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    ForceDirected(ForceParams),
    Hierarchical(HierarchicalParams),
    Circular(CircularParams),
    Radial(RadialParams),
}

impl Default for LayoutAlgorithm {
    fn default() -> Self {
        LayoutAlgorithm::ForceDirected(ForceParams::default())
    }
}

impl LayoutAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutAlgorithm::ForceDirected(_) => "force_directed",
            LayoutAlgorithm::Hierarchical(_) => "hierarchical",
            LayoutAlgorithm::Circular(_) => "circular",
            LayoutAlgorithm::Radial(_) => "radial",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    IterationCap,
    // zero nodes: nothing to do
    Trivial,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub positions: Vec<(NodeId, Pos2)>,
    pub bounds: Rect,
    pub iterations: usize,
    pub termination: Termination,
    pub energy: f32,
}

impl LayoutResult {
    pub(crate) fn trivial(center: Pos2) -> Self {
        Self {
            positions: Vec::new(),
            bounds: Rect::from_center_size(center, Vec2::ZERO),
            iterations: 0,
            termination: Termination::Trivial,
            energy: 0.0,
        }
    }

    /// Single-pass result used by the non-iterative algorithms.
    pub(crate) fn single_pass(positions: Vec<(NodeId, Pos2)>) -> Self {
        let bounds = bounds_of(&positions);
        Self { positions, bounds, iterations: 1, termination: Termination::Converged, energy: 0.0 }
    }

    pub fn converged(&self) -> bool {
        matches!(self.termination, Termination::Converged | Termination::Trivial)
    }

    pub fn position_of(&self, id: NodeId) -> Option<Pos2> {
        self.positions.iter().find(|(nid, _)| *nid == id).map(|(_, p)| *p)
    }
}

pub(crate) fn bounds_of(positions: &[(NodeId, Pos2)]) -> Rect {
    let mut r = Rect::NOTHING;
    for (_, p) in positions {
        r.extend_with(*p);
    }
    if positions.is_empty() { Rect::from_center_size(Pos2::ZERO, Vec2::ZERO) } else { r }
}

/// Shared cancellation flag checked between force iterations.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn compute_layout(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    algorithm: &LayoutAlgorithm,
    config: &LayoutConfig,
) -> LayoutResult {
    compute_layout_cancellable(nodes, edges, algorithm, config, &CancelToken::new())
}

pub fn compute_layout_cancellable(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    algorithm: &LayoutAlgorithm,
    config: &LayoutConfig,
    cancel: &CancelToken,
) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult::trivial(config.center);
    }
    let result = match algorithm {
        LayoutAlgorithm::ForceDirected(p) => return force::run(nodes, edges, p, config, cancel),
        LayoutAlgorithm::Hierarchical(p) => hierarchical::run(nodes, edges, p, config),
        LayoutAlgorithm::Circular(p) => circular::run(nodes, p, config),
        LayoutAlgorithm::Radial(p) => radial::run(nodes, edges, p, config),
    };
    keep_pinned(nodes, result)
}

// Single-pass layouts place every node; pinned ones with a known position are put back
fn keep_pinned(nodes: &[LayoutNode], mut result: LayoutResult) -> LayoutResult {
    let mut changed = false;
    for (node, (_, p)) in nodes.iter().zip(result.positions.iter_mut()) {
        if node.pinned
            && let Some(fixed) = node.position
        {
            *p = fixed;
            changed = true;
        }
    }
    if changed {
        result.bounds = bounds_of(&result.positions);
    }
    result
}

/// Snapshot of the graph in the shape the layout functions consume.
pub fn inputs_from_graph(graph: &VisualGraph) -> (Vec<LayoutNode>, Vec<LayoutEdge>) {
    let nodes = graph
        .nodes()
        .iter()
        .map(|n| LayoutNode { id: n.id, position: n.placed.then_some(n.position), pinned: n.pinned })
        .collect();
    let edges = graph
        .edges()
        .iter()
        .filter(|e| !graph.is_dangling(e))
        .map(|e| LayoutEdge { source: e.source, target: e.target, weight: e.strength.max(0.1) })
        .collect();
    (nodes, edges)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use uuid::Uuid;

    pub fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|_| Uuid::now_v7()).collect()
    }

    pub fn free_nodes(ids: &[NodeId]) -> Vec<LayoutNode> {
        ids.iter().map(|id| LayoutNode { id: *id, position: None, pinned: false }).collect()
    }

    pub fn edge(a: NodeId, b: NodeId) -> LayoutEdge {
        LayoutEdge { source: a, target: b, weight: 1.0 }
    }
}
