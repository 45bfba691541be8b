use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::geometry::Viewport;
use crate::graph_utils::graph::{NodeId, VisualGraph};

/// Node positions plus viewport state, enough to restore a user's arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    // node id -> (x, y, pinned)
    pub node_positions: Vec<(NodeId, f32, f32, bool)>,
    pub pan: (f32, f32),
    pub zoom: f32,
    #[serde(default)]
    pub rotation: f32,
}

impl LayoutSnapshot {
    pub fn from_runtime(graph: &VisualGraph, viewport: &Viewport) -> Self {
        let node_positions = graph
            .nodes()
            .iter()
            .filter(|n| n.placed)
            .map(|n| (n.id, n.position.x, n.position.y, n.pinned))
            .collect();
        Self {
            node_positions,
            pan: (viewport.pan.x, viewport.pan.y),
            zoom: viewport.zoom,
            rotation: viewport.rotation,
        }
    }

    pub fn positions(&self) -> HashMap<NodeId, (egui::Pos2, bool)> {
        self.node_positions
            .iter()
            .map(|(id, x, y, pinned)| (*id, (egui::pos2(*x, *y), *pinned)))
            .collect()
    }

    pub fn pan(&self) -> egui::Vec2 {
        egui::vec2(self.pan.0, self.pan.1)
    }
}

pub fn active_state_path(dir: &Path) -> PathBuf {
    dir.join("layout.ron")
}

pub fn versioned_state_path_now(dir: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    dir.join(format!("layout_{}.ron", stamp))
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("ron.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

fn to_ron(snapshot: &LayoutSnapshot) -> anyhow::Result<String> {
    let pretty = PrettyConfig::new().separate_tuple_members(true).enumerate_arrays(true);
    Ok(ron::ser::to_string_pretty(snapshot, pretty)?)
}

pub fn save_active(dir: &Path, snapshot: &LayoutSnapshot) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = active_state_path(dir);
    atomic_write(&path, to_ron(snapshot)?.as_bytes())?;
    Ok(path)
}

pub fn save_versioned(dir: &Path, snapshot: &LayoutSnapshot) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = versioned_state_path_now(dir);
    atomic_write(&path, to_ron(snapshot)?.as_bytes())?;
    Ok(path)
}

pub fn load_active(dir: &Path) -> anyhow::Result<Option<LayoutSnapshot>> {
    let path = active_state_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<LayoutSnapshot> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let state: LayoutSnapshot = ron::from_str(&buf)?;
    Ok(state)
}

pub fn list_versions(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with("layout_") && name.ends_with(".ron")
            {
                entries.push(p);
            }
        }
    }
    // sort descending by filename (timestamp)
    entries.sort();
    entries.reverse();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::{NodeKind, VisualNode};
    use uuid::Uuid;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mind-loom-{}-{}", tag, Uuid::now_v7().simple()))
    }

    #[test]
    fn active_snapshot_round_trips_through_disk() {
        let mut g = VisualGraph::new();
        let id = Uuid::now_v7();
        let mut n = VisualNode::new(id, NodeKind::Concept, "c").at(egui::pos2(3.5, -2.0));
        n.pinned = true;
        g.add_node(n);
        // unplaced nodes are not worth saving
        g.add_node(VisualNode::new(Uuid::now_v7(), NodeKind::Thought, "t"));
        let mut vp = Viewport::new(640.0, 480.0, 0.1, 5.0).unwrap();
        vp.zoom = 2.0;
        vp.pan = egui::vec2(10.0, 20.0);

        let dir = scratch_dir("active");
        let snap = LayoutSnapshot::from_runtime(&g, &vp);
        assert_eq!(snap.node_positions.len(), 1);
        save_active(&dir, &snap).unwrap();
        let back = load_active(&dir).unwrap().unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.positions()[&id], (egui::pos2(3.5, -2.0), true));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_active_file_is_none() {
        let dir = scratch_dir("missing");
        assert!(load_active(&dir).unwrap().is_none());
        assert!(list_versions(&dir).unwrap().is_empty());
    }

    #[test]
    fn versions_are_listed() {
        let dir = scratch_dir("versions");
        let snap = LayoutSnapshot { node_positions: Vec::new(), pan: (0.0, 0.0), zoom: 1.0, rotation: 0.0 };
        let path = save_versioned(&dir, &snap).unwrap();
        assert_eq!(list_versions(&dir).unwrap(), vec![path]);
        let _ = fs::remove_dir_all(&dir);
    }
}
