pub mod convert;
pub mod graph;
pub mod network;
pub mod stats;
