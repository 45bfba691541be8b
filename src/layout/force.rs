use std::collections::HashMap;

use egui::{Pos2, Vec2};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::quadtree::QuadTree;
use super::{bounds_of, CancelToken, LayoutConfig, LayoutEdge, LayoutNode, LayoutResult, Termination};
use crate::graph_utils::graph::NodeId;

// Squared distance floor so coincident or very close nodes cannot blow up repulsion
const MIN_DIST_SQ: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    pub repulsion: f32,
    pub attraction: f32,
    // spring rest length for an edge of weight 1
    pub rest_length: f32,
    pub centering: f32,
    // velocity multiplier applied every step
    pub damping: f32,
    pub time_step: f32,
    pub max_displacement: f32,
    pub max_iterations: usize,
    // summed |velocity| below which the simulation counts as settled
    pub convergence_threshold: f32,
    pub seed: u64,
    // 0 disables the quadtree approximation entirely
    pub barnes_hut_theta: f32,
    pub barnes_hut_threshold: usize,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            repulsion: 5000.0,
            attraction: 0.05,
            rest_length: 100.0,
            centering: 0.01,
            damping: 0.85,
            time_step: 1.0,
            max_displacement: 50.0,
            max_iterations: 500,
            convergence_threshold: 0.1,
            seed: 42,
            barnes_hut_theta: 0.8,
            barnes_hut_threshold: 400,
        }
    }
}

// Deterministic unit direction for nodes sitting on top of each other
fn separation_dir(i: usize, j: usize) -> Vec2 {
    let angle = (i * 31 + j * 17) as f32 * 2.399_963;
    Vec2::new(angle.cos(), angle.sin())
}

pub(crate) fn repulsion_pair(d: Vec2, strength: f32, i: usize, j: usize) -> Vec2 {
    let dist_sq = d.length_sq();
    if dist_sq <= f32::EPSILON {
        return separation_dir(i, j) * (strength / MIN_DIST_SQ);
    }
    let dist_sq_clamped = dist_sq.max(MIN_DIST_SQ);
    d / dist_sq.sqrt() * (strength / dist_sq_clamped)
}

pub(crate) fn run(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    params: &ForceParams,
    config: &LayoutConfig,
    cancel: &CancelToken,
) -> LayoutResult {
    let n = nodes.len();
    let mut rng = StdRng::seed_from_u64(params.seed);
    let spread = params.rest_length * (n as f32).sqrt().max(1.0);

    let mut pos: Vec<Pos2> = nodes
        .iter()
        .map(|node| match node.position {
            Some(p) if p.is_finite() => p,
            _ => Pos2::new(
                config.center.x + rng.gen_range(-0.5..0.5) * spread,
                config.center.y + rng.gen_range(-0.5..0.5) * spread,
            ),
        })
        .collect();
    let mut vel = vec![Vec2::ZERO; n];

    let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, node)| (node.id, i)).collect();
    // (a, b, rest length); self-loops and unknown endpoints exert no force
    let springs: Vec<(usize, usize, f32)> = edges
        .iter()
        .filter_map(|e| {
            let a = *index.get(&e.source)?;
            let b = *index.get(&e.target)?;
            (a != b).then(|| (a, b, params.rest_length * e.weight.max(0.0)))
        })
        .collect();

    let use_quadtree = params.barnes_hut_theta > 0.0 && n >= params.barnes_hut_threshold.max(2);
    let max_speed = params.max_displacement / params.time_step.max(f32::EPSILON);
    let mut forces = vec![Vec2::ZERO; n];
    let mut energy = f32::INFINITY;
    let mut iterations = 0;
    let mut termination = Termination::IterationCap;

    for _ in 0..params.max_iterations {
        if cancel.is_cancelled() {
            termination = Termination::Cancelled;
            break;
        }
        forces.iter_mut().for_each(|f| *f = Vec2::ZERO);

        // Repulsion: exact O(n^2) for small graphs, Barnes-Hut above the threshold
        if use_quadtree {
            let tree = QuadTree::build(&pos);
            for (i, f) in forces.iter_mut().enumerate() {
                *f += tree.repulsion_on(i, pos[i], params.barnes_hut_theta, params.repulsion);
            }
        } else {
            for i in 0..n {
                for j in (i + 1)..n {
                    let f = repulsion_pair(pos[i] - pos[j], params.repulsion, i, j);
                    forces[i] += f;
                    forces[j] -= f;
                }
            }
        }

        // Springs along edges: attract when stretched, push apart when compressed
        for &(a, b, rest) in &springs {
            let d = pos[b] - pos[a];
            let dist = d.length();
            if dist <= f32::EPSILON {
                continue;
            }
            let f = d / dist * (params.attraction * (dist - rest));
            forces[a] += f;
            forces[b] -= f;
        }

        // Centering moves the centroid toward the layout center without bending the shape
        if n > 0 {
            let centroid = pos.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2()) / n as f32;
            let pull = (config.center.to_vec2() - centroid) * params.centering;
            forces.iter_mut().for_each(|f| *f += pull);
        }

        energy = 0.0;
        for i in 0..n {
            if nodes[i].pinned {
                vel[i] = Vec2::ZERO;
                continue;
            }
            let mut v = (vel[i] + forces[i] * params.time_step) * params.damping;
            let speed = v.length();
            if speed > max_speed {
                v *= max_speed / speed;
            }
            if !v.is_finite() {
                v = Vec2::ZERO;
            }
            pos[i] += v * params.time_step;
            vel[i] = v;
            energy += v.length();
        }
        iterations += 1;

        if energy < params.convergence_threshold {
            termination = Termination::Converged;
            break;
        }
    }

    if params.max_iterations == 0 {
        energy = 0.0;
    }
    debug!(
        "force layout: {} nodes, {} springs, {} iterations, energy {:.4}, {:?}",
        n,
        springs.len(),
        iterations,
        energy,
        termination
    );

    let positions: Vec<(NodeId, Pos2)> = nodes.iter().zip(pos).map(|(node, p)| (node.id, p)).collect();
    let bounds = bounds_of(&positions);
    LayoutResult { positions, bounds, iterations, termination, energy }
}
