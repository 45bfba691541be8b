//! Visualization modes decide which part of the graph the viewport frames.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{NodeId, VisualGraph};
use crate::graph_utils::stats::connected_components;
use crate::interaction::selection::SelectionState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    #[default]
    Overview,
    // selection plus direct neighbors
    Focus,
    // connected component of the selection (or the largest one)
    Cluster,
    // shortest path between the first two selected nodes
    Path,
    // most recently touched nodes
    Temporal,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 5] = [
        VisualizationMode::Overview,
        VisualizationMode::Focus,
        VisualizationMode::Cluster,
        VisualizationMode::Path,
        VisualizationMode::Temporal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationMode::Overview => "overview",
            VisualizationMode::Focus => "focus",
            VisualizationMode::Cluster => "cluster",
            VisualizationMode::Path => "path",
            VisualizationMode::Temporal => "temporal",
        }
    }
}

fn all_ids(graph: &VisualGraph) -> Vec<NodeId> {
    graph.nodes().iter().map(|n| n.id).collect()
}

fn with_neighbors(graph: &VisualGraph, seeds: &[NodeId]) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    for &id in seeds {
        if !out.contains(&id) {
            out.push(id);
        }
        for nb in graph.neighbors(id) {
            if !out.contains(&nb) {
                out.push(nb);
            }
        }
    }
    out
}

/// Unweighted shortest path (undirected), endpoints included.
pub fn shortest_path(graph: &VisualGraph, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    if !graph.contains_node(from) || !graph.contains_node(to) {
        return None;
    }
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    prev.insert(from, from);
    while let Some(cur) = queue.pop_front() {
        if cur == to {
            let mut path = vec![to];
            let mut at = to;
            while let Some(&p) = prev.get(&at)
                && at != from
            {
                at = p;
                path.push(at);
            }
            path.reverse();
            return Some(path);
        }
        for nb in graph.neighbors(cur) {
            if let std::collections::hash_map::Entry::Vacant(e) = prev.entry(nb) {
                e.insert(cur);
                queue.push_back(nb);
            }
        }
    }
    None
}

/// Node ids the viewport should frame in `mode`. Modes that need a selection fall
/// back to a broader view when there is none.
pub fn framing_ids(mode: VisualizationMode, graph: &VisualGraph, selection: &SelectionState, temporal_window: usize) -> Vec<NodeId> {
    let selected: Vec<NodeId> = selection.selected_nodes().iter().copied().filter(|id| graph.contains_node(*id)).collect();
    match mode {
        VisualizationMode::Overview => all_ids(graph),
        VisualizationMode::Focus => {
            if selected.is_empty() {
                all_ids(graph)
            } else {
                with_neighbors(graph, &selected)
            }
        }
        VisualizationMode::Cluster => {
            let comps = connected_components(graph);
            let chosen = match selected.first() {
                Some(id) => comps.into_iter().find(|c| c.contains(id)),
                // largest; the first one on ties
                None => comps.into_iter().rev().max_by_key(|c| c.len()),
            };
            chosen.unwrap_or_default()
        }
        VisualizationMode::Path => match selected.as_slice() {
            [a, b, ..] => shortest_path(graph, *a, *b).unwrap_or_else(|| vec![*a, *b]),
            [] => all_ids(graph),
            [_] => with_neighbors(graph, &selected),
        },
        VisualizationMode::Temporal => {
            let mut stamped: Vec<(i64, usize, NodeId)> = graph
                .nodes()
                .iter()
                .enumerate()
                .filter_map(|(i, n)| n.metrics.updated_at.or(n.metrics.created_at).map(|t| (t, i, n.id)))
                .collect();
            if stamped.is_empty() {
                return all_ids(graph);
            }
            stamped.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            stamped.into_iter().take(temporal_window.max(1)).map(|(_, _, id)| id).collect()
        }
    }
}
