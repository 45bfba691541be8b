//! Backend-neutral display lists.
//!
//! [`pipeline::render`] turns the model into screen-space [`DrawCommand`]s; the
//! egui painter and the SVG writer are two consumers of the same list.

use egui::{Color32, Pos2, Rect};

use crate::graph_utils::graph::DashPattern;
use crate::persistence::settings::EngineSettings;

pub mod pipeline;
pub mod svg;

pub use pipeline::render;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStroke {
    pub width: f32,
    pub color: Color32,
    pub dash: DashPattern,
}

impl LineStroke {
    pub fn solid(width: f32, color: Color32) -> Self {
        Self { width, color, dash: DashPattern::Solid }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color32),
    // open polyline; a straight edge is two points
    Line { points: Vec<Pos2>, stroke: LineStroke },
    Quadratic { from: Pos2, ctrl: Pos2, to: Pos2, stroke: LineStroke },
    // closed convex polygon (arrowheads, diamonds)
    Polygon { points: Vec<Pos2>, fill: Color32, stroke: Option<LineStroke> },
    Circle { center: Pos2, radius: f32, fill: Option<Color32>, stroke: Option<LineStroke> },
    Rect { rect: Rect, fill: Option<Color32>, stroke: Option<LineStroke> },
    // text hangs below `pos`, horizontally centered
    Text { pos: Pos2, text: String, size: f32, color: Color32 },
}

/// Ordered draw commands for one frame, in screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    pub background: Color32,
    pub node_stroke: Color32,
    pub node_stroke_width: f32,
    pub selection_color: Color32,
    pub hover_color: Color32,
    pub highlight_color: Color32,
    pub label_color: Color32,
    pub label_size: f32,
    pub arrow_size: f32,
    pub lod_enabled: bool,
    pub label_min_zoom: f32,
    pub lod_hide_labels_node_threshold: usize,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(24, 24, 28),
            node_stroke: Color32::from_rgb(30, 30, 30),
            node_stroke_width: 1.0,
            selection_color: Color32::from_rgb(255, 200, 80),
            hover_color: Color32::from_rgb(120, 220, 255),
            highlight_color: Color32::from_rgb(255, 255, 255),
            label_color: Color32::from_rgb(230, 230, 230),
            label_size: 12.0,
            arrow_size: 8.0,
            lod_enabled: true,
            label_min_zoom: 0.7,
            lod_hide_labels_node_threshold: 200,
        }
    }
}

impl RenderStyle {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            lod_enabled: settings.lod_enabled,
            label_min_zoom: settings.lod_label_min_zoom,
            lod_hide_labels_node_threshold: settings.lod_hide_labels_node_threshold,
            ..Self::default()
        }
    }
}
