use std::collections::{HashMap, VecDeque};

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use super::{LayoutConfig, LayoutEdge, LayoutNode, LayoutResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchicalParams {
    pub orientation: Orientation,
    // distance between consecutive levels
    pub level_spacing: f32,
    // distance between neighbours inside a level
    pub node_spacing: f32,
}

impl Default for HierarchicalParams {
    fn default() -> Self {
        Self { orientation: Orientation::TopDown, level_spacing: 120.0, node_spacing: 80.0 }
    }
}

/// Level per node index. Roots (in-degree 0) start at level 0; every node left over
/// after that sits on a cycle, so the highest out-degree one seeds another BFS.
fn assign_levels(n: usize, out: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let mut level: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    for i in 0..n {
        if in_degree[i] == 0 {
            level[i] = Some(0);
            queue.push_back(i);
        }
    }
    loop {
        while let Some(cur) = queue.pop_front() {
            let next_level = level[cur].unwrap_or(0) + 1;
            for &nb in &out[cur] {
                if level[nb].is_none() {
                    level[nb] = Some(next_level);
                    queue.push_back(nb);
                }
            }
        }
        // max_by_key returns the last maximum, so walk in reverse to keep input order on ties
        let Some(seed) = (0..n).rev().filter(|&i| level[i].is_none()).max_by_key(|&i| out[i].len()) else {
            break;
        };
        level[seed] = Some(0);
        queue.push_back(seed);
    }
    level.into_iter().map(|l| l.unwrap_or(0)).collect()
}

pub(crate) fn run(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    params: &HierarchicalParams,
    config: &LayoutConfig,
) -> LayoutResult {
    let n = nodes.len();
    let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, node)| (node.id, i)).collect();
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for e in edges {
        let (Some(&a), Some(&b)) = (index.get(&e.source), index.get(&e.target)) else {
            continue;
        };
        if a == b {
            continue;
        }
        out[a].push(b);
        parents[b].push(a);
        in_degree[b] += 1;
    }

    let level = assign_levels(n, &out, &in_degree);
    let depth = level.iter().copied().max().unwrap_or(0);
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); depth + 1];
    for (i, &l) in level.iter().enumerate() {
        rows[l].push(i);
    }

    // Order each row by the mean slot of its parents in the row above to cut crossings
    let mut slot = vec![0.0f32; n];
    for l in 0..rows.len() {
        if l > 0 {
            let mut keyed: Vec<(f32, usize)> = rows[l]
                .iter()
                .map(|&i| {
                    let above: Vec<f32> = parents[i].iter().filter(|&&p| level[p] + 1 == l).map(|&p| slot[p]).collect();
                    let key = if above.is_empty() { f32::INFINITY } else { above.iter().sum::<f32>() / above.len() as f32 };
                    (key, i)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            rows[l] = keyed.into_iter().map(|(_, i)| i).collect();
        }
        for (k, &i) in rows[l].iter().enumerate() {
            slot[i] = k as f32;
        }
    }

    let mut pos = vec![Pos2::ZERO; n];
    let mid_level = depth as f32 * 0.5;
    for row in &rows {
        let mid_slot = (row.len() as f32 - 1.0) * 0.5;
        for &i in row {
            let along = (level[i] as f32 - mid_level) * params.level_spacing;
            let across = (slot[i] - mid_slot) * params.node_spacing;
            let offset = match params.orientation {
                Orientation::TopDown => Vec2::new(across, along),
                Orientation::BottomUp => Vec2::new(across, -along),
                Orientation::LeftRight => Vec2::new(along, across),
                Orientation::RightLeft => Vec2::new(-along, across),
            };
            pos[i] = config.center + offset;
        }
    }

    LayoutResult::single_pass(nodes.iter().zip(pos).map(|(node, p)| (node.id, p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::*;
    use crate::layout::{compute_layout, LayoutAlgorithm};

    fn layout(nodes: &[LayoutNode], edges: &[LayoutEdge], params: HierarchicalParams) -> LayoutResult {
        compute_layout(nodes, edges, &LayoutAlgorithm::Hierarchical(params), &LayoutConfig::default())
    }

    #[test]
    fn chain_top_down_stacks_levels() {
        let ids = ids(3);
        let edges = vec![edge(ids[0], ids[1]), edge(ids[1], ids[2])];
        let r = layout(&free_nodes(&ids), &edges, HierarchicalParams::default());
        let p: Vec<Pos2> = ids.iter().filter_map(|id| r.position_of(*id)).collect();
        assert_eq!(p[0], Pos2::new(0.0, -120.0));
        assert_eq!(p[1], Pos2::new(0.0, 0.0));
        assert_eq!(p[2], Pos2::new(0.0, 120.0));
    }

    #[test]
    fn siblings_share_a_level_and_are_centered() {
        let ids = ids(3);
        let edges = vec![edge(ids[0], ids[1]), edge(ids[0], ids[2])];
        let r = layout(&free_nodes(&ids), &edges, HierarchicalParams::default());
        let b = r.position_of(ids[1]).unwrap();
        let c = r.position_of(ids[2]).unwrap();
        assert_eq!(b.y, c.y);
        assert_eq!((c.x - b.x).abs(), 80.0);
        assert_eq!(b.x + c.x, 0.0);
        assert_eq!(r.position_of(ids[0]).unwrap().x, 0.0);
    }

    #[test]
    fn left_right_swaps_axes() {
        let ids = ids(2);
        let edges = vec![edge(ids[0], ids[1])];
        let params = HierarchicalParams { orientation: Orientation::LeftRight, ..HierarchicalParams::default() };
        let r = layout(&free_nodes(&ids), &edges, params);
        let a = r.position_of(ids[0]).unwrap();
        let b = r.position_of(ids[1]).unwrap();
        assert_eq!(a.y, b.y);
        assert!(a.x < b.x);
    }

    #[test]
    fn bottom_up_and_right_left_mirror_their_counterparts() {
        let ids = ids(3);
        let edges = vec![edge(ids[0], ids[1]), edge(ids[1], ids[2])];
        let with = |orientation| layout(&free_nodes(&ids), &edges, HierarchicalParams { orientation, ..HierarchicalParams::default() });
        let (td, bu) = (with(Orientation::TopDown), with(Orientation::BottomUp));
        let (lr, rl) = (with(Orientation::LeftRight), with(Orientation::RightLeft));
        for id in &ids {
            let (t, b) = (td.position_of(*id).unwrap(), bu.position_of(*id).unwrap());
            assert_eq!(b, Pos2::new(t.x, -t.y));
            let (l, r) = (lr.position_of(*id).unwrap(), rl.position_of(*id).unwrap());
            assert_eq!(r, Pos2::new(-l.x, l.y));
        }
        // roots end up at the bottom and on the right
        assert!(bu.position_of(ids[0]).unwrap().y > bu.position_of(ids[2]).unwrap().y);
        assert!(rl.position_of(ids[0]).unwrap().x > rl.position_of(ids[2]).unwrap().x);
    }

    #[test]
    fn pure_cycle_still_gets_levels() {
        let ids = ids(3);
        let edges = vec![edge(ids[0], ids[1]), edge(ids[1], ids[2]), edge(ids[2], ids[0])];
        let r = layout(&free_nodes(&ids), &edges, HierarchicalParams::default());
        let ys: Vec<f32> = ids.iter().map(|id| r.position_of(*id).unwrap().y).collect();
        assert!(ys.iter().all(|y| y.is_finite()));
        assert!(ys[0] < ys[1] && ys[1] < ys[2]);
    }
}
