//! Export of the current graph: JSON, SVG and CSV.

use egui::Color32;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::geometry::Viewport;
use crate::graph_utils::graph::{NodeShape, VisualGraph};
use crate::interaction::selection::SelectionState;
use crate::render::svg::to_svg;
use crate::render::{render, RenderStyle};

const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Svg,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Svg => "svg",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub pretty: bool,
    // SVG only: frame the whole graph instead of the current view
    pub fit_to_graph: bool,
    pub padding: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { format: ExportFormat::Json, pretty: true, fit_to_graph: false, padding: 40.0 }
    }
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self { format, ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExportOutput {
    Json(String),
    Svg(String),
    Csv { nodes: String, edges: String },
}

pub(crate) fn hex(c: Color32) -> String {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    if a == 255 { format!("#{:02x}{:02x}{:02x}", r, g, b) } else { format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a) }
}

fn shape_str(shape: NodeShape) -> &'static str {
    match shape {
        NodeShape::Circle => "circle",
        NodeShape::Rectangle => "rectangle",
        NodeShape::Diamond => "diamond",
    }
}

#[derive(Debug, Serialize)]
struct NodeOut<'a> {
    id: String,
    entity_id: Option<String>,
    kind: &'static str,
    label: &'a str,
    x: f32,
    y: f32,
    radius: f32,
    shape: &'static str,
    color: String,
    opacity: f32,
    pinned: bool,
    importance: f32,
    centrality: f32,
    degree: usize,
}

#[derive(Debug, Serialize)]
struct EdgeOut {
    id: String,
    source: String,
    target: String,
    kind: &'static str,
    strength: f32,
    confidence: f32,
    bidirectional: bool,
    width: f32,
    color: String,
    curvature: f32,
}

#[derive(Debug, Serialize)]
struct ViewportOut {
    pan_x: f32,
    pan_y: f32,
    zoom: f32,
    rotation: f32,
    width: f32,
    height: f32,
    // world-space [min_x, min_y, max_x, max_y] on screen at export time
    visible: [f32; 4],
}

#[derive(Debug, Serialize)]
struct GraphExport<'a> {
    version: u32,
    exported_at: String,
    nodes: Vec<NodeOut<'a>>,
    edges: Vec<EdgeOut>,
    viewport: ViewportOut,
}

fn node_rows(graph: &VisualGraph) -> Vec<NodeOut<'_>> {
    graph
        .nodes()
        .iter()
        .map(|n| NodeOut {
            id: n.id.to_string(),
            entity_id: n.entity_id.map(|e| e.to_string()),
            kind: n.kind.as_str(),
            label: &n.label,
            x: n.position.x,
            y: n.position.y,
            radius: n.radius,
            shape: shape_str(n.shape),
            color: hex(n.color),
            opacity: n.opacity,
            pinned: n.pinned,
            importance: n.metrics.importance,
            centrality: n.metrics.centrality,
            degree: n.metrics.degree,
        })
        .collect()
}

// Dangling edges are not part of the exported graph
fn edge_rows(graph: &VisualGraph) -> Vec<EdgeOut> {
    graph
        .edges()
        .iter()
        .filter(|e| !graph.is_dangling(e))
        .map(|e| EdgeOut {
            id: e.id.to_string(),
            source: e.source.to_string(),
            target: e.target.to_string(),
            kind: e.kind.as_str(),
            strength: e.strength,
            confidence: e.confidence,
            bidirectional: e.bidirectional,
            width: e.style.width,
            color: hex(e.style.color),
            curvature: e.style.curvature,
        })
        .collect()
}

fn export_json(graph: &VisualGraph, viewport: &Viewport, pretty: bool) -> Result<String, EngineError> {
    let seen = viewport.visible_world_rect();
    let doc = GraphExport {
        version: EXPORT_VERSION,
        exported_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        nodes: node_rows(graph),
        edges: edge_rows(graph),
        viewport: ViewportOut {
            pan_x: viewport.pan.x,
            pan_y: viewport.pan.y,
            zoom: viewport.zoom,
            rotation: viewport.rotation,
            width: viewport.width,
            height: viewport.height,
            visible: [seen.min.x, seen.min.y, seen.max.x, seen.max.y],
        },
    };
    let out = if pretty { serde_json::to_string_pretty(&doc) } else { serde_json::to_string(&doc) };
    out.map_err(|e| EngineError::Export(e.to_string()))
}

fn csv_table<T: Serialize>(rows: &[T]) -> Result<String, EngineError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for r in rows {
        wtr.serialize(r).map_err(|e| EngineError::Export(e.to_string()))?;
    }
    let bytes = wtr.into_inner().map_err(|e| EngineError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EngineError::Export(e.to_string()))
}

pub fn export(
    graph: &VisualGraph,
    viewport: &Viewport,
    selection: &SelectionState,
    style: &RenderStyle,
    options: &ExportOptions,
) -> Result<ExportOutput, EngineError> {
    match options.format {
        ExportFormat::Json => export_json(graph, viewport, options.pretty).map(ExportOutput::Json),
        ExportFormat::Svg => {
            let view = match graph.bounds() {
                Some(b) if options.fit_to_graph => viewport.fit_bounds(b, options.padding),
                _ => *viewport,
            };
            Ok(ExportOutput::Svg(to_svg(&render(graph, &view, selection, style))))
        }
        ExportFormat::Csv => {
            let nodes = csv_table(&node_rows(graph))?;
            let edges = csv_table(&edge_rows(graph))?;
            Ok(ExportOutput::Csv { nodes, edges })
        }
    }
}
