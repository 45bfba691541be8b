//! Hit testing and visibility culling under the viewport transform.
//!
//! Edge geometry is computed here in screen space and shared with the render
//! pipeline, so what is clickable is exactly what is drawn.

use egui::{Pos2, Rect, Vec2};

use crate::geometry::Viewport;
use crate::graph_utils::graph::{EdgeId, NodeId, VisualEdge, VisualGraph, VisualNode};

// Samples used to approximate a quadratic curve as a polyline
const CURVE_SAMPLES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Node(NodeId),
    Edge(EdgeId),
}

/// Screen-space shape of a drawn edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeGeometry {
    Line { from: Pos2, to: Pos2 },
    Quadratic { from: Pos2, ctrl: Pos2, to: Pos2 },
    // self-loop drawn as a circle touching the node
    Loop { center: Pos2, radius: f32 },
}

pub fn point_segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = Vec2::new(p.x - a.x, p.y - a.y);
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let proj = Pos2::new(a.x + ab.x * t, a.y + ab.y * t);
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}

fn quadratic_point(a: Pos2, c: Pos2, b: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    Pos2::new(
        u * u * a.x + 2.0 * u * t * c.x + t * t * b.x,
        u * u * a.y + 2.0 * u * t * c.y + t * t * b.y,
    )
}

impl EdgeGeometry {
    /// Builds the screen geometry for an edge between two resolved nodes.
    pub fn new(viewport: &Viewport, edge: &VisualEdge, source: &VisualNode, target: &VisualNode) -> Self {
        let a = viewport.world_to_screen(source.position);
        if edge.is_self_loop() {
            let r = source.radius * viewport.zoom;
            let radius = (r * 0.75).max(6.0);
            return EdgeGeometry::Loop { center: a - Vec2::new(0.0, r + radius * 0.5), radius };
        }
        let b = viewport.world_to_screen(target.position);
        let dir = b - a;
        let len = dir.length();
        if edge.style.curvature.abs() > f32::EPSILON && len > 1.0 {
            let mid = a.lerp(b, 0.5);
            let n = Vec2::new(-dir.y / len, dir.x / len);
            let ctrl = mid + n * (edge.style.curvature * len);
            EdgeGeometry::Quadratic { from: a, ctrl, to: b }
        } else {
            EdgeGeometry::Line { from: a, to: b }
        }
    }

    pub fn distance_to(&self, p: Pos2) -> f32 {
        match *self {
            EdgeGeometry::Line { from, to } => point_segment_distance(p, from, to),
            EdgeGeometry::Quadratic { .. } => self
                .polyline()
                .windows(2)
                .map(|w| point_segment_distance(p, w[0], w[1]))
                .fold(f32::INFINITY, f32::min),
            EdgeGeometry::Loop { center, radius } => ((p - center).length() - radius).abs(),
        }
    }

    /// Points along the edge; a straight line is its two endpoints.
    pub fn polyline(&self) -> Vec<Pos2> {
        match *self {
            EdgeGeometry::Line { from, to } => vec![from, to],
            EdgeGeometry::Quadratic { from, ctrl, to } => {
                (0..=CURVE_SAMPLES).map(|i| quadratic_point(from, ctrl, to, i as f32 / CURVE_SAMPLES as f32)).collect()
            }
            EdgeGeometry::Loop { center, radius } => (0..=CURVE_SAMPLES)
                .map(|i| center + Vec2::angled(std::f32::consts::TAU * i as f32 / CURVE_SAMPLES as f32) * radius)
                .collect(),
        }
    }

    /// Unit direction of travel when arriving at the target end.
    pub fn end_tangent(&self) -> Vec2 {
        match *self {
            EdgeGeometry::Line { from, to } => (to - from).normalized(),
            EdgeGeometry::Quadratic { ctrl, to, .. } => (to - ctrl).normalized(),
            EdgeGeometry::Loop { .. } => Vec2::new(0.0, 1.0),
        }
    }

    /// Unit direction of travel when arriving back at the source end (reverse direction).
    pub fn start_tangent(&self) -> Vec2 {
        match *self {
            EdgeGeometry::Line { from, to } => (from - to).normalized(),
            EdgeGeometry::Quadratic { from, ctrl, .. } => (from - ctrl).normalized(),
            EdgeGeometry::Loop { .. } => Vec2::new(0.0, 1.0),
        }
    }

    pub fn start(&self) -> Pos2 {
        match *self {
            EdgeGeometry::Line { from, .. } | EdgeGeometry::Quadratic { from, .. } => from,
            EdgeGeometry::Loop { center, radius } => center + Vec2::new(0.0, radius),
        }
    }

    pub fn end(&self) -> Pos2 {
        match *self {
            EdgeGeometry::Line { to, .. } | EdgeGeometry::Quadratic { to, .. } => to,
            EdgeGeometry::Loop { center, radius } => center + Vec2::new(0.0, radius),
        }
    }
}

pub fn node_screen_rect(viewport: &Viewport, node: &VisualNode) -> Rect {
    let c = viewport.world_to_screen(node.position);
    Rect::from_center_size(c, Vec2::splat(node.radius * viewport.zoom * 2.0))
}

pub fn is_node_visible(viewport: &Viewport, node: &VisualNode) -> bool {
    node_screen_rect(viewport, node).intersects(viewport.screen_rect())
}

/// Conservative: visible when either endpoint is. Dangling edges are never visible.
pub fn is_edge_visible(viewport: &Viewport, graph: &VisualGraph, edge: &VisualEdge) -> bool {
    match graph.endpoints(edge) {
        Some((s, t)) => is_node_visible(viewport, s) || is_node_visible(viewport, t),
        None => false,
    }
}

/// Visible node indexes in draw order (bottom to top).
pub fn visible_nodes(viewport: &Viewport, graph: &VisualGraph) -> Vec<usize> {
    let nodes = graph.nodes();
    graph.z_ordered().into_iter().filter(|&i| is_node_visible(viewport, &nodes[i])).collect()
}

pub fn visible_edges<'a>(viewport: &Viewport, graph: &'a VisualGraph) -> Vec<&'a VisualEdge> {
    graph.edges().iter().filter(|e| is_edge_visible(viewport, graph, e)).collect()
}

/// Topmost node whose disc contains the point.
pub fn hit_test_node(viewport: &Viewport, graph: &VisualGraph, screen: Pos2) -> Option<NodeId> {
    let world = viewport.screen_to_world(screen);
    let nodes = graph.nodes();
    graph
        .z_ordered()
        .into_iter()
        .rev()
        .map(|i| &nodes[i])
        .find(|n| (n.position - world).length() <= n.radius)
        .map(|n| n.id)
}

/// Nearest edge within its width plus `tolerance` screen pixels.
pub fn hit_test_edge(viewport: &Viewport, graph: &VisualGraph, screen: Pos2, tolerance: f32) -> Option<EdgeId> {
    let mut best: Option<(EdgeId, f32)> = None;
    for e in graph.edges() {
        let Some((s, t)) = graph.endpoints(e) else {
            continue;
        };
        let d = EdgeGeometry::new(viewport, e, s, t).distance_to(screen);
        if d <= e.style.width + tolerance {
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((e.id, d)),
            }
        }
    }
    best.map(|(id, _)| id)
}

/// Node hits take precedence; edges are only tested when no node is under the point.
pub fn hit_test(viewport: &Viewport, graph: &VisualGraph, screen: Pos2, tolerance: f32) -> Option<HitTarget> {
    if let Some(id) = hit_test_node(viewport, graph, screen) {
        return Some(HitTarget::Node(id));
    }
    hit_test_edge(viewport, graph, screen, tolerance).map(HitTarget::Edge)
}

/// Nodes whose screen-space center lies inside `rect` (rubber-band selection).
pub fn nodes_in_screen_rect(viewport: &Viewport, graph: &VisualGraph, rect: Rect) -> Vec<NodeId> {
    graph
        .nodes()
        .iter()
        .filter(|n| rect.contains(viewport.world_to_screen(n.position)))
        .map(|n| n.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::NodeKind;
    use uuid::Uuid;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0, 0.1, 10.0).unwrap()
    }

    fn node(x: f32, y: f32) -> VisualNode {
        VisualNode::new(Uuid::now_v7(), NodeKind::Thought, "n").at(Pos2::new(x, y))
    }

    #[test]
    fn center_always_hits_and_topmost_wins() {
        let mut g = VisualGraph::new();
        let mut a = node(100.0, 100.0);
        a.z = 1;
        let mut b = node(105.0, 100.0);
        b.z = 2;
        let (aid, bid) = (a.id, b.id);
        g.add_node(a);
        g.add_node(b);
        let vp = viewport();
        assert_eq!(hit_test_node(&vp, &g, Pos2::new(105.0, 100.0)), Some(bid));
        assert_eq!(hit_test_node(&vp, &g, Pos2::new(92.0, 100.0)), Some(aid));
        assert_eq!(hit_test_node(&vp, &g, Pos2::new(300.0, 300.0)), None);
    }

    #[test]
    fn node_hit_respects_zoom_and_pan() {
        let mut g = VisualGraph::new();
        let n = node(0.0, 0.0);
        let id = n.id;
        g.add_node(n);
        let mut vp = viewport();
        vp.pan = Vec2::new(400.0, 300.0);
        vp.zoom = 2.0;
        // radius 10 world units is 20 px at zoom 2
        assert_eq!(hit_test_node(&vp, &g, Pos2::new(418.0, 300.0)), Some(id));
        assert_eq!(hit_test_node(&vp, &g, Pos2::new(422.0, 300.0)), None);
    }

    #[test]
    fn edge_hit_uses_width_plus_tolerance() {
        let mut g = VisualGraph::new();
        let a = node(100.0, 100.0);
        let b = node(300.0, 100.0);
        let e = VisualEdge::new(Uuid::now_v7(), a.id, b.id);
        let eid = e.id;
        g.add_node(a);
        g.add_node(b);
        g.add_edge(e);
        let vp = viewport();
        // width 1.5 + tolerance 8
        assert_eq!(hit_test_edge(&vp, &g, Pos2::new(200.0, 109.0), 8.0), Some(eid));
        assert_eq!(hit_test_edge(&vp, &g, Pos2::new(200.0, 110.0), 8.0), None);
        assert_eq!(hit_test(&vp, &g, Pos2::new(100.0, 100.0), 8.0).map(|h| matches!(h, HitTarget::Node(_))), Some(true));
        assert_eq!(hit_test(&vp, &g, Pos2::new(200.0, 100.0), 8.0), Some(HitTarget::Edge(eid)));
    }

    #[test]
    fn curved_edge_is_hit_along_the_curve() {
        let mut g = VisualGraph::new();
        let a = node(100.0, 100.0);
        let b = node(300.0, 100.0);
        let mut e = VisualEdge::new(Uuid::now_v7(), a.id, b.id);
        e.style.curvature = 0.25;
        let eid = e.id;
        g.add_node(a);
        g.add_node(b);
        g.add_edge(e);
        let vp = viewport();
        // control point 50 px off the chord, curve apex 25 px off
        assert_eq!(hit_test_edge(&vp, &g, Pos2::new(200.0, 125.0), 8.0), Some(eid));
        assert_eq!(hit_test_edge(&vp, &g, Pos2::new(200.0, 100.0), 8.0), None);
    }

    #[test]
    fn dangling_edges_are_invisible_and_never_hit() {
        let mut g = VisualGraph::new();
        let a = node(100.0, 100.0);
        let e = VisualEdge::new(Uuid::now_v7(), a.id, Uuid::now_v7());
        g.add_node(a);
        g.add_edge(e.clone());
        let vp = viewport();
        assert!(!is_edge_visible(&vp, &g, &e));
        assert_eq!(hit_test_edge(&vp, &g, Pos2::new(100.0, 100.0), 100.0), None);
    }

    #[test]
    fn culling_keeps_edges_with_one_visible_end() {
        let mut g = VisualGraph::new();
        let a = node(100.0, 100.0);
        let b = node(5000.0, 100.0);
        let e = VisualEdge::new(Uuid::now_v7(), a.id, b.id);
        g.add_node(a);
        g.add_node(b);
        g.add_edge(e.clone());
        let vp = viewport();
        assert_eq!(visible_nodes(&vp, &g), vec![0]);
        assert!(is_edge_visible(&vp, &g, &e));
    }

    #[test]
    fn rubber_band_selects_by_center() {
        let mut g = VisualGraph::new();
        let a = node(50.0, 50.0);
        let b = node(500.0, 500.0);
        let aid = a.id;
        g.add_node(a);
        g.add_node(b);
        let picked = nodes_in_screen_rect(&viewport(), &g, Rect::from_min_max(Pos2::ZERO, Pos2::new(100.0, 100.0)));
        assert_eq!(picked, vec![aid]);
    }
}
