//! Mind-Loom: interactive visualization engine for thought/knowledge graphs.
//!
//! The [`engine::Engine`] facade owns the graph arena, viewport, selection and
//! interaction state. Layout, hit-testing and rendering are pure functions over
//! that state so they can be driven without a real drawing surface.

pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph_utils;
pub mod interaction;
pub mod layout;
pub mod persistence;
pub mod render;
pub mod spatial;

pub use engine::Engine;
pub use error::EngineError;
