//! World/screen coordinate transforms and viewport animation.

pub mod animation;
pub mod viewport;

pub use animation::{ease_in_out_cubic, ViewportAnimation};
pub use viewport::Viewport;
