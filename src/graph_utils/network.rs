//! Data contract with the connection-discovery collaborator.
//!
//! Discovery turns thoughts and knowledge items into a [`Network`]; the engine only
//! consumes that value and never re-derives connections itself.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::graph::{ConnectionKind, DashPattern, NodeKind, NodeMetrics};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Thought {
    pub id: Uuid,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// Optional rendering hints attached to a connection record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationHints {
    // "#rrggbb" or "#rrggbbaa"
    pub color: Option<String>,
    pub width: Option<f32>,
    pub curvature: Option<f32>,
    pub dash: Option<DashPattern>,
    pub arrow: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub kind: ConnectionKind,
    #[serde(default = "ConnectionRecord::default_strength")]
    pub strength: f32,
    #[serde(default = "ConnectionRecord::default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub hints: Option<VisualizationHints>,
}

impl ConnectionRecord {
    pub(crate) fn default_strength() -> f32 { 0.5 }
    pub(crate) fn default_confidence() -> f32 { 1.0 }
}

impl Default for ConnectionRecord {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::default(),
            strength: Self::default_strength(),
            confidence: Self::default_confidence(),
            bidirectional: false,
            hints: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: Uuid,
    // id of the thought or knowledge item this node stands for
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub metrics: Option<NodeMetrics>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub id: Uuid,
    pub source: Uuid,
    pub target: Uuid,
    #[serde(default)]
    pub connection: Option<ConnectionRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<NetworkEdge>,
}

#[async_trait]
pub trait ConnectionDiscovery: Send + Sync {
    async fn discover(&self, thoughts: &[Thought], knowledge: &[KnowledgeItem]) -> anyhow::Result<Network>;
}

/// Discovery adapter over a network that was computed ahead of time.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedNetwork(pub Network);

#[async_trait]
impl ConnectionDiscovery for PrecomputedNetwork {
    async fn discover(&self, _thoughts: &[Thought], _knowledge: &[KnowledgeItem]) -> anyhow::Result<Network> {
        Ok(self.0.clone())
    }
}

/// On-disk bundle read by the viewer: entities plus their discovered network.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default)]
    pub thoughts: Vec<Thought>,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeItem>,
    #[serde(default)]
    pub network: Network,
}

impl GraphFile {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(v)
    }
}

const TOPICS: [(&str, &[&str]); 4] = [
    ("quantum", &["entanglement notes", "qubit error rates", "measurement problem", "decoherence"]),
    ("gardening", &["tomato blight", "compost ratios", "seed saving", "companion planting"]),
    ("rust", &["borrow checker", "async executors", "trait objects", "lifetimes"]),
    ("music", &["modal harmony", "practice log", "rhythm drills", "ear training"]),
];

impl GraphFile {
    /// Deterministic demo data: `n` thoughts spread over a few topics, one
    /// knowledge item per topic, and a discovered network linking them.
    pub fn sample(n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut next = 0u128;
        let mut id = || {
            next += 1;
            Uuid::from_u128(((seed as u128) << 64) | next)
        };
        let mut file = GraphFile::default();
        let mut by_topic: Vec<Vec<Uuid>> = vec![Vec::new(); TOPICS.len()];

        for (t, (topic, _)) in TOPICS.iter().enumerate() {
            let item = KnowledgeItem {
                id: id(),
                title: format!("{} reference", topic),
                content: format!("Collected sources about {}", topic),
                created_at: Some(t as i64),
                ..KnowledgeItem::default()
            };
            let node_id = id();
            file.network.nodes.push(NetworkNode {
                id: node_id,
                entity_id: Some(item.id),
                kind: NodeKind::Knowledge,
                label: None,
                metrics: None,
            });
            by_topic[t].push(node_id);
            file.knowledge.push(item);
        }

        for i in 0..n {
            let t = rng.gen_range(0..TOPICS.len());
            let (topic, phrases) = TOPICS[t];
            let phrase = phrases[rng.gen_range(0..phrases.len())];
            let stamp = 100 + i as i64;
            let thought = Thought {
                id: id(),
                content: format!("{} #{}: {}", phrase, i, topic),
                tags: vec![topic.to_string()],
                created_at: Some(stamp),
                updated_at: Some(stamp),
            };
            let node_id = id();
            file.network.nodes.push(NetworkNode {
                id: node_id,
                entity_id: Some(thought.id),
                kind: NodeKind::Thought,
                label: None,
                metrics: Some(NodeMetrics { importance: rng.gen_range(0.0..1.0), ..NodeMetrics::default() }),
            });
            file.thoughts.push(thought);

            // link to one or two earlier members of the same topic
            let links = rng.gen_range(1..=2).min(by_topic[t].len());
            for _ in 0..links {
                let other = by_topic[t][rng.gen_range(0..by_topic[t].len())];
                let kind = if other == by_topic[t][0] { ConnectionKind::Reference } else { ConnectionKind::Semantic };
                file.network.edges.push(NetworkEdge {
                    id: id(),
                    source: node_id,
                    target: other,
                    connection: Some(ConnectionRecord { kind, strength: rng.gen_range(0.2..1.0), ..ConnectionRecord::default() }),
                });
            }
            // occasional cross-topic bridge
            let pick = rng.gen_range(0..file.network.nodes.len());
            if rng.gen_bool(0.08)
                && let Some(other) = file.network.nodes.get(pick).map(|n| n.id)
                && other != node_id
            {
                file.network.edges.push(NetworkEdge {
                    id: id(),
                    source: node_id,
                    target: other,
                    connection: Some(ConnectionRecord { kind: ConnectionKind::Related, strength: 0.2, ..ConnectionRecord::default() }),
                });
            }
            by_topic[t].push(node_id);
        }
        file
    }
}
