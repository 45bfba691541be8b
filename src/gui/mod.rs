pub mod frontend;
pub mod painter;
