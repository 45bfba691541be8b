use std::f32::consts::TAU;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use super::{LayoutConfig, LayoutNode, LayoutResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircularParams {
    pub radius: f32,
    // radians, measured clockwise from +x in screen orientation
    pub start_angle: f32,
    pub end_angle: f32,
}

impl Default for CircularParams {
    fn default() -> Self {
        Self { radius: 250.0, start_angle: 0.0, end_angle: TAU }
    }
}

pub(crate) fn run(nodes: &[LayoutNode], params: &CircularParams, config: &LayoutConfig) -> LayoutResult {
    let n = nodes.len();
    if n == 1 {
        return LayoutResult::single_pass(vec![(nodes[0].id, config.center)]);
    }
    let span = params.end_angle - params.start_angle;
    // A full turn would put the last node on top of the first
    let full_circle = span.abs() >= TAU - 1e-4;
    let step = if full_circle { span / n as f32 } else { span / (n - 1) as f32 };

    let positions = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let angle = params.start_angle + step * i as f32;
            (node.id, config.center + Vec2::angled(angle) * params.radius)
        })
        .collect::<Vec<(_, Pos2)>>();
    LayoutResult::single_pass(positions)
}
