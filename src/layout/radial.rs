use std::collections::{HashMap, VecDeque};
use std::f32::consts::TAU;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use super::{LayoutConfig, LayoutEdge, LayoutNode, LayoutResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialParams {
    pub ring_spacing: f32,
}

impl Default for RadialParams {
    fn default() -> Self {
        Self { ring_spacing: 120.0 }
    }
}

pub(crate) fn run(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    params: &RadialParams,
    config: &LayoutConfig,
) -> LayoutResult {
    let n = nodes.len();
    let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, node)| (node.id, i)).collect();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in edges {
        let (Some(&a), Some(&b)) = (index.get(&e.source), index.get(&e.target)) else {
            continue;
        };
        if a != b {
            adj[a].push(b);
            adj[b].push(a);
        }
    }

    // Highest degree wins; on ties the earliest node in input order
    let mut center = 0;
    for i in 1..n {
        if adj[i].len() > adj[center].len() {
            center = i;
        }
    }

    let mut depth: Vec<Option<usize>> = vec![None; n];
    depth[center] = Some(0);
    let mut queue = VecDeque::from([center]);
    while let Some(cur) = queue.pop_front() {
        let d = depth[cur].unwrap_or(0) + 1;
        for &nb in &adj[cur] {
            if depth[nb].is_none() {
                depth[nb] = Some(d);
                queue.push_back(nb);
            }
        }
    }
    let max_depth = depth.iter().flatten().copied().max().unwrap_or(0);
    // Unreachable nodes share one extra ring outside the deepest one
    let ring: Vec<usize> = depth.iter().map(|d| d.unwrap_or(max_depth + 1)).collect();

    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &r) in ring.iter().enumerate() {
        members.entry(r).or_default().push(i);
    }

    let mut pos = vec![config.center; n];
    for (r, idxs) in &members {
        if *r == 0 {
            continue;
        }
        let radius = *r as f32 * params.ring_spacing;
        let step = TAU / idxs.len() as f32;
        for (k, &i) in idxs.iter().enumerate() {
            pos[i] = config.center + Vec2::angled(step * k as f32) * radius;
        }
    }

    LayoutResult::single_pass(nodes.iter().zip(pos).map(|(node, p)| (node.id, p)).collect::<Vec<(_, Pos2)>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::*;
    use crate::layout::{compute_layout, LayoutAlgorithm};

    #[test]
    fn hub_sits_at_center_with_leaves_on_first_ring() {
        let ids = ids(4);
        // ids[2] is the hub
        let edges = vec![edge(ids[0], ids[2]), edge(ids[1], ids[2]), edge(ids[2], ids[3])];
        let r = compute_layout(
            &free_nodes(&ids),
            &edges,
            &LayoutAlgorithm::Radial(RadialParams::default()),
            &LayoutConfig::default(),
        );
        assert_eq!(r.position_of(ids[2]), Some(Pos2::ZERO));
        for id in [ids[0], ids[1], ids[3]] {
            let d = r.position_of(id).unwrap().to_vec2().length();
            assert!((d - 120.0).abs() < 1e-3);
        }
    }

    #[test]
    fn unreachable_nodes_go_to_outer_ring() {
        let ids = ids(4);
        let edges = vec![edge(ids[0], ids[1]), edge(ids[1], ids[2])];
        let r = compute_layout(
            &free_nodes(&ids),
            &edges,
            &LayoutAlgorithm::Radial(RadialParams { ring_spacing: 50.0 }),
            &LayoutConfig::default(),
        );
        // center ids[1], depth 1 for ids[0] and ids[2], isolated ids[3] on ring 2
        assert_eq!(r.position_of(ids[1]), Some(Pos2::ZERO));
        let d = r.position_of(ids[3]).unwrap().to_vec2().length();
        assert!((d - 100.0).abs() < 1e-3);
    }

    #[test]
    fn degree_ties_pick_first_node() {
        let ids = ids(2);
        let edges = vec![edge(ids[0], ids[1])];
        let r = compute_layout(
            &free_nodes(&ids),
            &edges,
            &LayoutAlgorithm::Radial(RadialParams::default()),
            &LayoutConfig::default(),
        );
        assert_eq!(r.position_of(ids[0]), Some(Pos2::ZERO));
    }
}
