use egui::{Color32, Pos2, Rect, Vec2};

use super::{DisplayList, DrawCommand, LineStroke, RenderStyle};
use crate::geometry::Viewport;
use crate::graph_utils::graph::{NodeShape, VisualEdge, VisualGraph, VisualNode};
use crate::interaction::selection::SelectionState;
use crate::spatial::{self, EdgeGeometry};

// Gap between a node outline and its selection/hover ring, in pixels
const RING_GAP: f32 = 3.0;

fn arrowhead(tip: Pos2, dir: Vec2, size: f32, color: Color32) -> Option<DrawCommand> {
    if dir.length_sq() < 0.25 || !tip.is_finite() {
        return None;
    }
    let base = tip - dir * size;
    let perp = dir.rot90() * (size * 0.5);
    Some(DrawCommand::Polygon { points: vec![tip, base + perp, base - perp], fill: color, stroke: None })
}

fn edge_commands(
    out: &mut Vec<DrawCommand>,
    viewport: &Viewport,
    edge: &VisualEdge,
    source: &VisualNode,
    target: &VisualNode,
    selection: &SelectionState,
    style: &RenderStyle,
) {
    let selected = selection.is_edge_selected(edge.id) || edge.selected;
    let hovered = selection.hovered_edge() == Some(edge.id);
    let base = if selected {
        style.selection_color
    } else if hovered || edge.highlighted {
        style.hover_color
    } else {
        edge.style.color
    };
    let color = base.gamma_multiply(edge.opacity.clamp(0.0, 1.0));
    let width = if selected || hovered { edge.style.width + 1.0 } else { edge.style.width };
    let stroke = LineStroke { width, color, dash: edge.style.dash };

    let geom = EdgeGeometry::new(viewport, edge, source, target);
    match geom {
        EdgeGeometry::Line { from, to } => out.push(DrawCommand::Line { points: vec![from, to], stroke }),
        EdgeGeometry::Quadratic { from, ctrl, to } => out.push(DrawCommand::Quadratic { from, ctrl, to, stroke }),
        EdgeGeometry::Loop { center, radius } => {
            out.push(DrawCommand::Circle { center, radius, fill: None, stroke: Some(stroke) });
            return;
        }
    }
    if !edge.style.arrow {
        return;
    }
    let size = style.arrow_size.max(width * 3.0);
    let end_dir = geom.end_tangent();
    if let Some(cmd) = arrowhead(geom.end() - end_dir * (target.radius * viewport.zoom), end_dir, size, color) {
        out.push(cmd);
    }
    if edge.bidirectional {
        let start_dir = geom.start_tangent();
        if let Some(cmd) = arrowhead(geom.start() - start_dir * (source.radius * viewport.zoom), start_dir, size, color) {
            out.push(cmd);
        }
    }
}

fn node_commands(out: &mut Vec<DrawCommand>, viewport: &Viewport, node: &VisualNode, selection: &SelectionState, style: &RenderStyle) {
    let c = viewport.world_to_screen(node.position);
    let r = node.radius * viewport.zoom;
    let opacity = node.opacity.clamp(0.0, 1.0);
    let fill = node.color.gamma_multiply(opacity);
    let outline = LineStroke::solid(style.node_stroke_width, style.node_stroke.gamma_multiply(opacity));

    out.push(match node.shape {
        NodeShape::Circle => DrawCommand::Circle { center: c, radius: r, fill: Some(fill), stroke: Some(outline) },
        NodeShape::Rectangle => {
            DrawCommand::Rect { rect: Rect::from_center_size(c, Vec2::splat(r * 2.0)), fill: Some(fill), stroke: Some(outline) }
        }
        NodeShape::Diamond => DrawCommand::Polygon {
            points: vec![c - Vec2::new(0.0, r), c + Vec2::new(r, 0.0), c + Vec2::new(0.0, r), c - Vec2::new(r, 0.0)],
            fill,
            stroke: Some(outline),
        },
    });

    let ring = if selection.is_node_selected(node.id) || node.selected {
        Some(LineStroke::solid(2.5, style.selection_color))
    } else if selection.hovered_node() == Some(node.id) {
        Some(LineStroke::solid(2.0, style.hover_color))
    } else if node.highlighted {
        Some(LineStroke::solid(1.5, style.highlight_color))
    } else {
        None
    };
    if let Some(stroke) = ring {
        out.push(DrawCommand::Circle { center: c, radius: r + RING_GAP, fill: None, stroke: Some(stroke) });
    }
}

fn label_forced(node: &VisualNode, selection: &SelectionState) -> bool {
    node.highlighted || node.selected || selection.is_node_selected(node.id) || selection.hovered_node() == Some(node.id)
}

/// Builds the display list for the current state. Pure: the model is only read.
pub fn render(graph: &VisualGraph, viewport: &Viewport, selection: &SelectionState, style: &RenderStyle) -> DisplayList {
    let mut out = vec![DrawCommand::Clear(style.background)];

    for edge in spatial::visible_edges(viewport, graph) {
        let Some((s, t)) = graph.endpoints(edge) else {
            continue;
        };
        edge_commands(&mut out, viewport, edge, s, t, selection, style);
    }

    let visible = spatial::visible_nodes(viewport, graph);
    let nodes = graph.nodes();
    for &i in &visible {
        node_commands(&mut out, viewport, &nodes[i], selection, style);
    }

    // LOD: labels need enough zoom and a small enough graph, except for nodes in focus
    let all_labels = !style.lod_enabled
        || (viewport.zoom >= style.label_min_zoom && graph.node_count() < style.lod_hide_labels_node_threshold);
    for &i in &visible {
        let node = &nodes[i];
        if node.label.is_empty() || !(all_labels || label_forced(node, selection)) {
            continue;
        }
        let r = node.radius * viewport.zoom;
        out.push(DrawCommand::Text {
            pos: viewport.world_to_screen(node.position) + Vec2::new(0.0, r + 4.0),
            text: node.label.clone(),
            size: style.label_size,
            color: style.label_color.gamma_multiply(node.opacity.clamp(0.0, 1.0)),
        });
    }

    DisplayList { width: viewport.width, height: viewport.height, commands: out }
}
