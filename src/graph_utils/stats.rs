use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::graph::{NodeId, VisualGraph};

/// Descriptive aggregates over the in-memory graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    // undirected: edges / (n * (n - 1) / 2)
    pub density: f64,
    pub average_degree: f64,
    pub max_degree: usize,
    // degree -> number of nodes with that degree
    pub degree_distribution: BTreeMap<usize, usize>,
    pub type_distribution: BTreeMap<String, usize>,
    pub connection_type_distribution: BTreeMap<String, usize>,
    pub isolated_nodes: usize,
    pub connected_components: usize,
    pub average_strength: f64,
    pub dangling_edges: usize,
}

pub fn connected_components(graph: &VisualGraph) -> Vec<Vec<NodeId>> {
    let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for e in graph.edges() {
        if e.is_self_loop() || graph.is_dangling(e) {
            continue;
        }
        adj.entry(e.source).or_default().push(e.target);
        adj.entry(e.target).or_default().push(e.source);
    }
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut out = Vec::new();
    for n in graph.nodes() {
        if !seen.insert(n.id) {
            continue;
        }
        let mut comp = vec![n.id];
        let mut queue = VecDeque::from([n.id]);
        while let Some(cur) = queue.pop_front() {
            for &next in adj.get(&cur).map(|v| v.as_slice()).unwrap_or(&[]) {
                if seen.insert(next) {
                    comp.push(next);
                    queue.push_back(next);
                }
            }
        }
        out.push(comp);
    }
    out
}

pub fn calculate_statistics(graph: &VisualGraph) -> GraphStatistics {
    let n = graph.node_count();
    let live: Vec<_> = graph.edges().iter().filter(|e| !graph.is_dangling(e)).collect();
    let m = live.len();

    let degrees = graph.degrees();
    let mut degree_distribution = BTreeMap::new();
    for d in degrees.values() {
        *degree_distribution.entry(*d).or_insert(0) += 1;
    }
    let mut type_distribution = BTreeMap::new();
    for node in graph.nodes() {
        *type_distribution.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
    }
    let mut connection_type_distribution = BTreeMap::new();
    for e in &live {
        *connection_type_distribution.entry(e.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let possible = if n >= 2 { (n * (n - 1)) as f64 / 2.0 } else { 0.0 };
    let density = if possible > 0.0 { m as f64 / possible } else { 0.0 };
    let average_degree = if n > 0 { degrees.values().sum::<usize>() as f64 / n as f64 } else { 0.0 };
    let average_strength = if m > 0 { live.iter().map(|e| e.strength as f64).sum::<f64>() / m as f64 } else { 0.0 };

    GraphStatistics {
        node_count: n,
        edge_count: m,
        density,
        average_degree,
        max_degree: degrees.values().copied().max().unwrap_or(0),
        degree_distribution,
        type_distribution,
        connection_type_distribution,
        isolated_nodes: degrees.values().filter(|d| **d == 0).count(),
        connected_components: connected_components(graph).len(),
        average_strength,
        dangling_edges: graph.edge_count() - m,
    }
}
