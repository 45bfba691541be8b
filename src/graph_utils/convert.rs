//! Network → visual record conversion.
//!
//! Malformed input never aborts a load: duplicate or nil node ids and edges with
//! unknown endpoints are skipped and counted in the [`ConversionReport`].

use std::collections::HashMap;

use egui::{Color32, Pos2};
use log::{debug, warn};
use uuid::Uuid;

use super::graph::{ConnectionKind, EdgeStyle, NodeKind, NodeShape, VisualEdge, VisualGraph, VisualNode};
use super::network::{ConnectionRecord, KnowledgeItem, Network, Thought};

const MAX_LABEL_CHARS: usize = 40;

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub base_radius: f32,
    pub importance_radius_scale: f32,
    // placeholder spiral center for nodes without a position yet
    pub center: Pos2,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { base_radius: 10.0, importance_radius_scale: 8.0, center: Pos2::ZERO }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionReport {
    pub nodes_loaded: usize,
    pub edges_loaded: usize,
    pub skipped_nodes: usize,
    pub skipped_edges: usize,
    pub warnings: Vec<String>,
}

impl ConversionReport {
    fn skip_node(&mut self, msg: String) {
        warn!("skipping node: {}", msg);
        self.skipped_nodes += 1;
        self.warnings.push(msg);
    }

    fn skip_edge(&mut self, msg: String) {
        warn!("skipping edge: {}", msg);
        self.skipped_edges += 1;
        self.warnings.push(msg);
    }
}

pub fn color_for_kind(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Thought => Color32::from_rgb(0x7b, 0xa3, 0xff),
        NodeKind::Knowledge => Color32::from_rgb(0x7b, 0xff, 0xa3),
        NodeKind::Concept => Color32::from_rgb(0xff, 0xa3, 0x7b),
        NodeKind::Cluster => Color32::from_rgb(0xa3, 0x7b, 0xff),
    }
}

pub fn shape_for_kind(kind: NodeKind) -> NodeShape {
    match kind {
        NodeKind::Thought | NodeKind::Cluster => NodeShape::Circle,
        NodeKind::Knowledge => NodeShape::Rectangle,
        NodeKind::Concept => NodeShape::Diamond,
    }
}

pub fn color_for_connection(kind: ConnectionKind) -> Color32 {
    match kind {
        ConnectionKind::Related => Color32::from_rgb(200, 200, 200),
        ConnectionKind::Semantic => Color32::from_rgb(120, 220, 255),
        ConnectionKind::Temporal => Color32::from_rgb(0xff, 0xe0, 0x7b),
        ConnectionKind::Causal => Color32::from_rgb(0xff, 0x7b, 0xa3),
        ConnectionKind::Reference => Color32::from_rgb(0x9a, 0xcd, 0x32),
        ConnectionKind::Supports => Color32::from_rgb(0x7b, 0xff, 0xa3),
        ConnectionKind::Contradicts => Color32::from_rgb(0xcd, 0x32, 0x9a),
        ConnectionKind::Other => Color32::from_rgb(160, 160, 160),
    }
}

/// Parses `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.trim().strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn truncate_label(s: &str) -> String {
    let first_line = s.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= MAX_LABEL_CHARS {
        return first_line.to_string();
    }
    let mut out: String = first_line.chars().take(MAX_LABEL_CHARS - 1).collect();
    out.push('…');
    out
}

fn short_id(id: Uuid) -> String {
    let s = id.as_simple().to_string();
    s.chars().rev().take(8).collect::<Vec<char>>().into_iter().rev().collect()
}

// Golden-angle spiral placement around the provided center.
// k is the 0-based index along the spiral.
pub fn golden_spiral_position(center: Pos2, k: u32, spacing: f32) -> Pos2 {
    let golden_angle = std::f32::consts::TAU * (1.0 - 1.0 / 1.618_034);
    let t = k as f32;
    let r = spacing * t.sqrt();
    let theta = t * golden_angle;
    Pos2::new(center.x + r * theta.cos(), center.y + r * theta.sin())
}

// Spread parallel edges between the same pair so they stay distinguishable: 0, +s, -s, +2s, ...
fn parallel_offset(k: usize) -> f32 {
    const STEP: f32 = 0.2;
    if k == 0 {
        return 0.0;
    }
    let magnitude = k.div_ceil(2) as f32 * STEP;
    if k % 2 == 1 { magnitude } else { -magnitude }
}

pub fn build_visual_graph(
    network: &Network,
    thoughts: &[Thought],
    knowledge: &[KnowledgeItem],
    opts: &ConvertOptions,
) -> (VisualGraph, ConversionReport) {
    let thought_by_id: HashMap<Uuid, &Thought> = thoughts.iter().map(|t| (t.id, t)).collect();
    let knowledge_by_id: HashMap<Uuid, &KnowledgeItem> = knowledge.iter().map(|k| (k.id, k)).collect();

    let mut graph = VisualGraph::new();
    let mut report = ConversionReport::default();

    for (i, nn) in network.nodes.iter().enumerate() {
        if nn.id.is_nil() {
            report.skip_node(format!("node #{} has a nil id", i));
            continue;
        }
        let mut metrics = nn.metrics.clone().unwrap_or_default();
        let (entity_label, content, created, updated) = match nn.entity_id {
            Some(eid) => {
                if let Some(t) = thought_by_id.get(&eid) {
                    (Some(truncate_label(&t.content)), t.content.clone(), t.created_at, t.updated_at)
                } else if let Some(k) = knowledge_by_id.get(&eid) {
                    (Some(truncate_label(&k.title)), k.content.clone(), k.created_at, k.updated_at)
                } else {
                    debug!("node {} references unknown entity {}", nn.id, eid);
                    (None, String::new(), None, None)
                }
            }
            None => (None, String::new(), None, None),
        };
        metrics.created_at = metrics.created_at.or(created);
        metrics.updated_at = metrics.updated_at.or(updated);
        if !metrics.importance.is_finite() {
            metrics.importance = 0.0;
        }
        if !metrics.centrality.is_finite() {
            metrics.centrality = 0.0;
        }

        let label = nn
            .label
            .as_deref()
            .map(truncate_label)
            .filter(|s| !s.is_empty())
            .or(entity_label.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| short_id(nn.id));

        let mut node = VisualNode::new(nn.id, nn.kind, label);
        node.entity_id = nn.entity_id;
        node.content = content;
        node.shape = shape_for_kind(nn.kind);
        node.color = color_for_kind(nn.kind);
        let importance = metrics.importance.clamp(0.0, 1.0);
        node.radius = opts.base_radius + importance * opts.importance_radius_scale;
        if nn.kind == NodeKind::Cluster {
            node.radius *= 1.5;
        }
        node.position = golden_spiral_position(opts.center, graph.node_count() as u32, opts.base_radius * 4.0);
        node.metrics = metrics;

        if !graph.add_node(node) {
            report.skip_node(format!("duplicate node id {}", nn.id));
        }
    }

    let mut pair_counts: HashMap<(Uuid, Uuid), usize> = HashMap::new();
    for ne in &network.edges {
        if !graph.contains_node(ne.source) || !graph.contains_node(ne.target) {
            report.skip_edge(format!("edge {} references a missing node ({} -> {})", ne.id, ne.source, ne.target));
            continue;
        }
        if graph.contains_edge(ne.id) {
            report.skip_edge(format!("duplicate edge id {}", ne.id));
            continue;
        }
        let record = ne.connection.clone().unwrap_or_default();
        let strength = if record.strength.is_finite() {
            record.strength.clamp(0.0, 1.0)
        } else {
            ConnectionRecord::default_strength()
        };
        let confidence = if record.confidence.is_finite() { record.confidence.clamp(0.0, 1.0) } else { 1.0 };

        // offsets are measured against the (lower id, higher id) direction; a reversed
        // edge flips its normal, so its curvature is negated to land on its own slot
        let reversed = ne.source > ne.target;
        let key = if reversed { (ne.target, ne.source) } else { (ne.source, ne.target) };
        let nth = pair_counts.entry(key).or_insert(0);
        let spread = if reversed { -parallel_offset(*nth) } else { parallel_offset(*nth) };
        *nth += 1;

        let hints = record.hints.clone().unwrap_or_default();
        let mut style = EdgeStyle {
            color: color_for_connection(record.kind),
            width: 1.0 + strength * 2.0,
            curvature: spread,
            ..EdgeStyle::default()
        };
        if let Some(c) = hints.color.as_deref().and_then(parse_hex_color) {
            style.color = c;
        }
        if let Some(w) = hints.width.filter(|w| w.is_finite() && *w > 0.0) {
            style.width = w;
        }
        if let Some(c) = hints.curvature.filter(|c| c.is_finite()) {
            style.curvature = c + spread;
        }
        if let Some(d) = hints.dash {
            style.dash = d;
        }
        if let Some(a) = hints.arrow {
            style.arrow = a;
        }

        let mut edge = VisualEdge::new(ne.id, ne.source, ne.target);
        edge.kind = record.kind;
        edge.strength = strength;
        edge.confidence = confidence;
        edge.bidirectional = record.bidirectional;
        edge.style = style;
        graph.add_edge(edge);
    }

    // Degree is structural; recompute it from what was actually loaded
    let degrees = graph.degrees();
    for n in graph.nodes_mut() {
        n.metrics.degree = degrees.get(&n.id).copied().unwrap_or(0);
    }

    report.nodes_loaded = graph.node_count();
    report.edges_loaded = graph.edge_count();
    (graph, report)
}
