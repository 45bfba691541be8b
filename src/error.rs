use thiserror::Error;

use crate::graph_utils::graph::{EdgeId, NodeId};

/// Failures surfaced by the engine facade.
///
/// Data errors during conversion are not represented here: offending nodes and
/// edges are skipped and reported through a `ConversionReport` instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("drawing surface unavailable ({width}x{height})")]
    Surface { width: f32, height: f32 },
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
    #[error("graph load failed: {0}")]
    Load(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
