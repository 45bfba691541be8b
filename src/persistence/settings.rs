use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::layout::LayoutAlgorithm;

const SETTINGS_JSON: &str = "settings.json";
const SETTINGS_RON: &str = "settings.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // If None, use OS default autosave directory for layout snapshots
    pub autosave_override: Option<PathBuf>,
    // If None, use OS temporary directory for exports
    pub export_override: Option<PathBuf>,
    // Viewport
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub fit_padding: f32,
    // Persist UI/LOD settings between runs
    pub lod_enabled: bool,
    pub lod_label_min_zoom: f32,
    pub lod_hide_labels_node_threshold: usize,
    // Interaction
    pub hit_tolerance_px: f32,
    pub drag_enabled: bool,
    pub pan_enabled: bool,
    pub zoom_step: f32,
    pub click_slop_px: f32,
    pub click_max_ms: u64,
    pub keyboard_pan_step: f32,
    pub pin_dragged_nodes: bool,
    pub animation_ms: u64,
    // Highlighting
    pub dim_opacity: f32,
    // Layout
    pub default_layout: LayoutAlgorithm,
    pub layout_on_load: bool,
    // Node sizing at conversion time
    pub base_node_radius: f32,
    pub importance_radius_scale: f32,
    // Temporal mode frames this many most recent nodes
    pub temporal_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            autosave_override: None,
            export_override: None,
            zoom_min: 0.1,
            zoom_max: 5.0,
            fit_padding: 40.0,
            lod_enabled: true,
            lod_label_min_zoom: 0.7,
            lod_hide_labels_node_threshold: 200,
            hit_tolerance_px: 8.0,
            drag_enabled: true,
            pan_enabled: true,
            zoom_step: 1.1,
            click_slop_px: 4.0,
            click_max_ms: 350,
            keyboard_pan_step: 40.0,
            pin_dragged_nodes: true,
            animation_ms: 500,
            dim_opacity: 0.3,
            default_layout: LayoutAlgorithm::default(),
            layout_on_load: true,
            base_node_radius: 10.0,
            importance_radius_scale: 10.0,
            temporal_window: 20,
        }
    }
}

impl EngineSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Mind-Loom
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Mind-Loom");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Mind-Loom
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Mind-Loom");
            }
            return PathBuf::from("Mind-Loom");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Mind-Loom or ~/.config/Mind-Loom
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Mind-Loom");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Mind-Loom");
        }
    }

    fn autosave_default_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\Mind-Loom\Snapshots else TEMP
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join("Mind-Loom").join("Snapshots");
            }
            if let Ok(temp) = std::env::var("TEMP") {
                return PathBuf::from(temp).join("Mind-Loom");
            }
            return PathBuf::from("Mind-Loom");
        }
        #[cfg(not(target_os = "windows"))]
        {
            // $XDG_STATE_HOME/mind-loom or ~/.local/state/mind-loom, else the temp dir
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("mind-loom");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("mind-loom");
            }
            return std::env::temp_dir().join("Mind-Loom");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir())
    }

    /// Reads `settings.json` from `dir`. A legacy `settings.ron` is migrated to JSON
    /// on first read; with neither present the defaults are returned.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let json_path = dir.join(SETTINGS_JSON);
        if json_path.exists() {
            let v: Self = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
            return Ok(v.sanitized());
        }
        let ron_path = dir.join(SETTINGS_RON);
        if ron_path.exists() {
            let v: Self = ron::from_str(&fs::read_to_string(&ron_path)?)?;
            if let Err(e) = v.save_to(dir) {
                warn!("could not migrate {} to JSON: {:#}", ron_path.display(), e);
            }
            return Ok(v.sanitized());
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir())
    }

    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(SETTINGS_JSON), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Repairs values a hand-edited file could break (inverted or non-positive zoom range, etc).
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !(self.zoom_min.is_finite() && self.zoom_min > 0.0) {
            self.zoom_min = d.zoom_min;
        }
        if !(self.zoom_max.is_finite() && self.zoom_max > 0.0) {
            self.zoom_max = d.zoom_max;
        }
        if self.zoom_min > self.zoom_max {
            std::mem::swap(&mut self.zoom_min, &mut self.zoom_max);
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            self.zoom_step = d.zoom_step;
        }
        self.dim_opacity = if self.dim_opacity.is_finite() { self.dim_opacity.clamp(0.0, 1.0) } else { d.dim_opacity };
        self
    }

    /// Where layout snapshots go: the override, else a per-OS state directory.
    pub fn autosave_dir(&self) -> PathBuf {
        self.autosave_override.clone().unwrap_or_else(Self::autosave_default_dir)
    }

    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// `{temp_dir}/Mind-Loom/exports`
    pub fn export_default_dir() -> PathBuf {
        std::env::temp_dir().join("Mind-Loom").join("exports")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_override.clone().unwrap_or_else(Self::export_default_dir)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn click_max(&self) -> Duration {
        Duration::from_millis(self.click_max_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{ "dim_opacity": 0.5 }"#).unwrap();
        assert_eq!(s.dim_opacity, 0.5);
        assert_eq!(s.lod_label_min_zoom, 0.7);
        assert_eq!(s.default_layout, LayoutAlgorithm::default());
    }

    #[test]
    fn sanitize_repairs_inverted_zoom() {
        let s = EngineSettings { zoom_min: 4.0, zoom_max: 0.5, zoom_step: 0.0, ..EngineSettings::default() }.sanitized();
        assert_eq!((s.zoom_min, s.zoom_max), (0.5, 4.0));
        assert_eq!(s.zoom_step, 1.1);
    }

    #[test]
    fn layout_choice_survives_json() {
        let mut s = EngineSettings::default();
        s.default_layout = LayoutAlgorithm::Circular(crate::layout::CircularParams { radius: 42.0, ..Default::default() });
        let back: EngineSettings = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn legacy_ron_is_migrated_to_json() {
        let dir = std::env::temp_dir().join(format!("mind_loom_settings_{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SETTINGS_RON), "(dim_opacity: 0.5, zoom_step: 1.2)").unwrap();
        let s = EngineSettings::load_from(&dir).unwrap();
        assert_eq!((s.dim_opacity, s.zoom_step), (0.5, 1.2));
        assert!(dir.join(SETTINGS_JSON).exists());
        assert_eq!(EngineSettings::load_from(&dir).unwrap(), s);
        let _ = fs::remove_dir_all(dir);
    }
}
