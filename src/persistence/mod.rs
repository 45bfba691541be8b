pub mod persist;
pub mod settings;

pub use persist::LayoutSnapshot;
pub use settings::EngineSettings;
