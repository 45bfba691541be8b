use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use egui::{Pos2, Vec2};
use uuid::Uuid;

use mind_loom::engine::{ExportFormat, ExportOptions, ExportOutput, VisualizationMode};
use mind_loom::events::{EngineEvent, EventKind};
use mind_loom::graph_utils::graph::NodeKind;
use mind_loom::graph_utils::network::{
    ConnectionDiscovery, KnowledgeItem, Network, NetworkEdge, NetworkNode, PrecomputedNetwork, Thought,
};
use mind_loom::interaction::{InputEvent, Modifiers};
use mind_loom::layout::{compute_layout, ForceParams, LayoutAlgorithm, LayoutConfig, LayoutEdge, LayoutNode, Termination};
use mind_loom::persistence::EngineSettings;
use mind_loom::render::DrawCommand;
use mind_loom::spatial::{hit_test, HitTarget};
use mind_loom::{Engine, EngineError};

fn node(id: Uuid, label: &str) -> NetworkNode {
    NetworkNode { id, entity_id: None, kind: NodeKind::Thought, label: Some(label.to_string()), metrics: None }
}

fn link(a: Uuid, b: Uuid) -> NetworkEdge {
    NetworkEdge { id: Uuid::now_v7(), source: a, target: b, connection: None }
}

fn network(nodes: &[(Uuid, &str)], edges: &[(Uuid, Uuid)]) -> Network {
    Network {
        nodes: nodes.iter().map(|(id, l)| node(*id, l)).collect(),
        edges: edges.iter().map(|(a, b)| link(*a, *b)).collect(),
    }
}

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mind_loom_it_{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn settings() -> EngineSettings {
    EngineSettings { layout_on_load: false, ..EngineSettings::default() }
}

fn engine() -> Engine {
    Engine::new(settings(), 800.0, 600.0).unwrap()
}

fn record(engine: &mut Engine, kind: EventKind) -> Arc<Mutex<Vec<EngineEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine.on(kind, move |ev| {
        sink.lock().unwrap().push(ev.clone());
        Ok(())
    });
    seen
}

struct Delayed(Network, Duration);

#[async_trait]
impl ConnectionDiscovery for Delayed {
    async fn discover(&self, _t: &[Thought], _k: &[KnowledgeItem]) -> anyhow::Result<Network> {
        tokio::time::sleep(self.1).await;
        Ok(self.0.clone())
    }
}

struct Broken;

#[async_trait]
impl ConnectionDiscovery for Broken {
    async fn discover(&self, _t: &[Thought], _k: &[KnowledgeItem]) -> anyhow::Result<Network> {
        anyhow::bail!("discovery service unavailable")
    }
}

#[test]
fn engine_rejects_zero_sized_surface() {
    assert!(matches!(Engine::new(settings(), 0.0, 600.0), Err(EngineError::Surface { .. })));
}

#[test]
fn wheel_zoom_keeps_pointer_anchored_and_round_trips_with_rotation() {
    let mut e = engine();
    let pivot = Pos2::new(610.0, 120.0);
    let world = e.viewport().screen_to_world(pivot);
    e.handle_event(InputEvent::Wheel { pos: pivot, delta: -3.0 });
    assert!(e.viewport().zoom > 1.0);
    assert!((e.viewport().world_to_screen(world) - pivot).length() < 1e-2);

    let mut vp = *e.viewport();
    vp.rotation = 0.7;
    for p in [Pos2::new(-250.0, 40.0), Pos2::new(13.0, -999.0), Pos2::ZERO] {
        let back = vp.screen_to_world(vp.world_to_screen(p));
        assert!((back - p).length() < 1e-2, "{p:?} -> {back:?}");
    }
}

#[test]
fn hit_test_matches_node_discs() {
    let mut e = engine();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::ZERO).unwrap();
    let r = e.graph().node(a).unwrap().radius;
    let center = e.viewport().world_to_screen(Pos2::ZERO);
    for i in 0..16 {
        let dir = Vec2::angled(i as f32 * std::f32::consts::TAU / 16.0);
        let inside = center + dir * (r - 0.5);
        let outside = center + dir * (r + 0.5);
        assert_eq!(hit_test(e.viewport(), e.graph(), inside, 8.0), Some(HitTarget::Node(a)));
        assert_eq!(hit_test(e.viewport(), e.graph(), outside, 8.0), None);
    }
}

#[test]
fn far_point_misses_with_edges_loaded() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::ZERO).unwrap();
    e.set_node_position(b, Pos2::new(200.0, 0.0)).unwrap();
    let edge = e.graph().edges()[0].id;
    let vp = e.viewport();
    assert_eq!(hit_test(vp, e.graph(), vp.world_to_screen(Pos2::new(100.0, 0.0)), 8.0), Some(HitTarget::Edge(edge)));
    assert_eq!(hit_test(vp, e.graph(), vp.world_to_screen(Pos2::new(100.0, 250.0)), 8.0), None);
    assert_eq!(hit_test(vp, e.graph(), vp.world_to_screen(Pos2::new(-150.0, -150.0)), 8.0), None);
}

#[test]
fn opposite_parallel_edges_draw_apart_and_stay_pickable() {
    let mut e = engine();
    let (a, b) = (Uuid::from_u128(1), Uuid::from_u128(2));
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b), (b, a), (a, b)]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::new(-100.0, 0.0)).unwrap();
    e.set_node_position(b, Pos2::new(100.0, 0.0)).unwrap();
    let ids: Vec<Uuid> = e.graph().edges().iter().map(|x| x.id).collect();

    let curves: Vec<(Pos2, Pos2, Pos2)> = e
        .render()
        .commands
        .into_iter()
        .filter_map(|c| match c {
            DrawCommand::Quadratic { from, ctrl, to, .. } => Some((from, ctrl, to)),
            _ => None,
        })
        .collect();
    assert_eq!(curves.len(), 2);
    assert!((curves[0].1 - curves[1].1).length() > 40.0, "{curves:?}");

    // apex of each curve picks its own edge
    for (k, (from, ctrl, to)) in curves.into_iter().enumerate() {
        let apex = from.lerp(ctrl, 0.5).lerp(ctrl.lerp(to, 0.5), 0.5);
        assert_eq!(hit_test(e.viewport(), e.graph(), apex, 8.0), Some(HitTarget::Edge(ids[k + 1])));
    }
}

#[test]
fn render_is_idempotent() {
    let mut e = engine();
    let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b"), (c, "c")], &[(a, b), (b, c)]), &[], &[]).unwrap();
    e.run_layout();
    let first = e.render();
    let second = e.render();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn selection_is_trimmed_to_loaded_nodes_on_reload() {
    let mut e = engine();
    let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    let seen = record(&mut e, EventKind::SelectionChanged);
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    e.select_node(a).unwrap();
    e.load_network(&network(&[(b, "b"), (c, "c")], &[(b, c)]), &[], &[]).unwrap();
    assert!(e.selection().selected_nodes().is_empty());
    assert_eq!(seen.lock().unwrap().last(), Some(&EngineEvent::SelectionChanged { nodes: vec![], edges: vec![] }));

    e.select_node(b).unwrap();
    e.load_network(&network(&[(b, "b")], &[]), &[], &[]).unwrap();
    assert_eq!(e.selection().selected_nodes(), &[b]);
    assert!(e.graph().node(b).unwrap().selected);
}

#[test]
fn reload_warm_starts_surviving_nodes() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::new(42.0, -7.0)).unwrap();
    e.set_node_pinned(a, true).unwrap();
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    let n = e.graph().node(a).unwrap();
    assert_eq!(n.position, Pos2::new(42.0, -7.0));
    assert!(n.pinned && n.placed);
    assert!(!e.graph().node(b).unwrap().placed);
}

#[test]
fn three_node_path_lays_out_nearly_straight() {
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::now_v7()).collect();
    let nodes: Vec<LayoutNode> = ids.iter().map(|id| LayoutNode { id: *id, position: None, pinned: false }).collect();
    let edges = vec![
        LayoutEdge { source: ids[0], target: ids[1], weight: 1.0 },
        LayoutEdge { source: ids[1], target: ids[2], weight: 1.0 },
    ];
    let algo = LayoutAlgorithm::ForceDirected(ForceParams { max_iterations: 300, ..ForceParams::default() });
    let r = compute_layout(&nodes, &edges, &algo, &LayoutConfig::default());
    let (a, b, c) = (r.positions[0].1, r.positions[1].1, r.positions[2].1);
    let off_line = (b - a.lerp(c, 0.5)).length();
    assert!(off_line < 0.1 * (c - a).length(), "B is {off_line} away from the midpoint");
}

#[test]
fn four_cycle_converges_with_fixed_seed() {
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
    let nodes: Vec<LayoutNode> = ids.iter().map(|id| LayoutNode { id: *id, position: None, pinned: false }).collect();
    let edges: Vec<LayoutEdge> =
        (0..4).map(|i| LayoutEdge { source: ids[i], target: ids[(i + 1) % 4], weight: 1.0 }).collect();
    let algo = LayoutAlgorithm::ForceDirected(ForceParams { seed: 11, ..ForceParams::default() });
    let r = compute_layout(&nodes, &edges, &algo, &LayoutConfig::default());
    assert_eq!(r.termination, Termination::Converged);
    assert!(r.iterations < 500);
}

#[test]
fn search_highlights_matches_and_dims_the_rest() {
    let mut e = engine();
    let (q, g, r) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(q, "Quantum entanglement"), (g, "Gardening"), (r, "Rust lifetimes")], &[(q, g)]), &[], &[])
        .unwrap();
    assert_eq!(e.search_nodes("quantum"), vec![q]);
    let graph = e.graph();
    assert_eq!(graph.node(q).unwrap().opacity, 1.0);
    assert!(graph.node(q).unwrap().highlighted);
    assert_eq!(graph.node(g).unwrap().opacity, 0.3);
    assert_eq!(graph.node(r).unwrap().opacity, 0.3);
    assert_eq!(graph.edges()[0].opacity, 0.3);

    assert!(e.search_nodes("  ").is_empty());
    assert!(e.graph().nodes().iter().all(|n| n.opacity == 1.0 && !n.highlighted));
}

#[test]
fn focus_on_node_centers_it_after_the_animation() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::new(100.0, 100.0)).unwrap();
    e.focus_on_node(a, Duration::from_millis(500)).unwrap();
    assert!(e.tick(Instant::now() + Duration::from_millis(600)));
    let screen = e.viewport().world_to_screen(Pos2::new(100.0, 100.0));
    assert!((screen - Pos2::new(400.0, 300.0)).length() <= 1.0, "{screen:?}");
    assert!(e.graph().node(b).unwrap().highlighted);
    assert!(matches!(e.focus_on_node(Uuid::now_v7(), Duration::ZERO), Err(EngineError::UnknownNode(_))));
}

fn on_screen(e: &Engine, world: Pos2) -> bool {
    e.viewport().screen_rect().contains(e.viewport().world_to_screen(world))
}

#[test]
fn focus_mode_frames_the_neighborhood_and_overview_frames_everything() {
    let mut e = engine();
    let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b"), (c, "c")], &[(a, b)]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::ZERO).unwrap();
    e.set_node_position(b, Pos2::new(2000.0, 0.0)).unwrap();
    e.set_node_position(c, Pos2::new(-2000.0, 500.0)).unwrap();
    e.select_node(a).unwrap();

    e.set_visualization_mode(VisualizationMode::Focus);
    assert_eq!(e.mode(), VisualizationMode::Focus);
    e.tick(Instant::now() + Duration::from_secs(5));
    assert!(on_screen(&e, Pos2::ZERO) && on_screen(&e, Pos2::new(2000.0, 0.0)));
    assert!(!on_screen(&e, Pos2::new(-2000.0, 500.0)));

    e.show_overview();
    e.tick(Instant::now() + Duration::from_secs(5));
    for p in [Pos2::ZERO, Pos2::new(2000.0, 0.0), Pos2::new(-2000.0, 500.0)] {
        assert!(on_screen(&e, p), "{p:?} off screen");
    }
}

#[tokio::test]
async fn overlapping_loads_resolve_last_call_wins() {
    let mut e = engine();
    let (old, new) = (Uuid::now_v7(), Uuid::now_v7());
    let slow = Delayed(network(&[(old, "old")], &[]), Duration::from_millis(30));
    let fast = PrecomputedNetwork(network(&[(new, "new")], &[]));
    let loader = e.loader();
    let (first, second) = tokio::join!(loader.prepare(&slow, &[], &[]), loader.prepare(&fast, &[], &[]));
    assert!(!e.commit_load(first.unwrap()).unwrap());
    assert!(e.commit_load(second.unwrap()).unwrap());
    assert!(e.graph().contains_node(new));
    assert!(!e.graph().contains_node(old));
}

#[tokio::test]
async fn failed_load_reports_error_and_keeps_graph() {
    let mut e = engine();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    let errors = record(&mut e, EventKind::Error);
    let res = e.load_graph_data(&Broken, &[], &[]).await;
    assert!(matches!(res, Err(EngineError::Load(ref m)) if m.contains("unavailable")));
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert!(e.graph().contains_node(a));
}

#[tokio::test]
async fn async_load_emits_data_loaded() {
    let mut e = engine();
    let loaded = record(&mut e, EventKind::DataLoaded);
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let discovery = PrecomputedNetwork(network(&[(a, "a"), (b, "b")], &[(a, b), (a, Uuid::now_v7())]));
    assert!(e.load_graph_data(&discovery, &[], &[]).await.unwrap());
    let events = loaded.lock().unwrap();
    assert!(matches!(events[0], EngineEvent::DataLoaded { nodes: 2, edges: 1, skipped: 1, .. }));
}

#[test]
fn panicking_subscriber_does_not_block_others() {
    let mut e = engine();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    e.on(EventKind::SelectionChanged, |_| panic!("bad subscriber"));
    let id = e.on(EventKind::SelectionChanged, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    e.select_node(a).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(e.off(id));
    e.clear_selection();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn click_on_node_selects_and_emits() {
    let mut e = engine();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::ZERO).unwrap();
    let seen = record(&mut e, EventKind::SelectionChanged);
    let at = e.viewport().world_to_screen(Pos2::ZERO);
    let t = Instant::now();
    e.handle_event(InputEvent::PointerDown { pos: at, modifiers: Modifiers::NONE, time: t });
    e.handle_event(InputEvent::PointerUp { pos: at, modifiers: Modifiers::NONE, time: t + Duration::from_millis(50) });
    assert_eq!(e.selection().selected_nodes(), &[a]);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn statistics_on_triangle_plus_isolated_node() {
    let mut e = engine();
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
    let nodes: Vec<(Uuid, &str)> = ids.iter().map(|id| (*id, "n")).collect();
    e.load_network(&network(&nodes, &[(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[0])]), &[], &[]).unwrap();
    let s = e.calculate_statistics();
    assert_eq!((s.node_count, s.edge_count), (4, 3));
    assert_eq!(s.connected_components, 2);
    assert_eq!(s.isolated_nodes, 1);
    assert_eq!(s.max_degree, 2);
    assert!((s.density - 0.5).abs() < 1e-9);
    assert!((s.average_degree - 1.5).abs() < 1e-9);
}

#[test]
fn removed_node_leaves_dangling_edge_out_of_exports() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    e.select_node(b).unwrap();
    e.remove_node(b).unwrap();
    assert!(e.selection().selected_nodes().is_empty());
    assert_eq!(e.graph().edge_count(), 1);
    assert_eq!(e.calculate_statistics().dangling_edges, 1);
    let ExportOutput::Json(json) = e.export(&ExportOptions::new(ExportFormat::Json)).unwrap() else {
        panic!("expected json");
    };
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["edges"].as_array().unwrap().len(), 0);
}

#[test]
fn removing_a_node_updates_neighbor_degrees() {
    let mut e = engine();
    let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b"), (c, "c")], &[(a, b), (b, c), (c, a)]), &[], &[]).unwrap();
    assert_eq!(e.graph().node(a).unwrap().metrics.degree, 2);
    e.remove_node(c).unwrap();
    assert_eq!(e.graph().node(a).unwrap().metrics.degree, 1);
    assert_eq!(e.graph().node(b).unwrap().metrics.degree, 1);
}

#[test]
fn ctrl_drag_box_selects_and_emits() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::ZERO).unwrap();
    e.set_node_position(b, Pos2::new(200.0, 0.0)).unwrap();
    let seen = record(&mut e, EventKind::SelectionChanged);
    let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
    let from = e.viewport().world_to_screen(Pos2::new(-60.0, -60.0));
    let to = e.viewport().world_to_screen(Pos2::new(60.0, 60.0));
    let t = Instant::now();
    e.handle_event(InputEvent::PointerDown { pos: from, modifiers: ctrl, time: t });
    e.handle_event(InputEvent::PointerMove { pos: to, time: t + Duration::from_millis(20) });
    assert!(e.selection_band().is_some());
    e.handle_event(InputEvent::PointerUp { pos: to, modifiers: ctrl, time: t + Duration::from_millis(40) });
    assert!(e.selection_band().is_none());
    assert_eq!(e.selection().selected_nodes(), &[a]);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn csv_export_writes_two_files() {
    let mut e = engine();
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b")], &[(a, b)]), &[], &[]).unwrap();
    let dir = temp_dir();
    let paths = e.export_to_path(&ExportOptions::new(ExportFormat::Csv), Some(&dir)).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| p.exists() && p.extension().is_some_and(|x| x == "csv")));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cancelled_background_layout_is_discarded() {
    let mut e = engine();
    let ids: Vec<Uuid> = (0..20).map(|_| Uuid::now_v7()).collect();
    let nodes: Vec<(Uuid, &str)> = ids.iter().map(|id| (*id, "n")).collect();
    let edges: Vec<(Uuid, Uuid)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
    e.load_network(&network(&nodes, &edges), &[], &[]).unwrap();
    let before = e.graph().positions();
    e.start_layout();
    assert!(e.is_layout_running());
    e.cancel_layout();
    assert!(!e.is_layout_running());
    assert!(e.poll_layout().is_none());
    assert_eq!(e.graph().positions(), before);
    assert!(e.graph().nodes().iter().all(|n| !n.placed));
}

#[test]
fn background_layout_is_applied_when_polled() {
    let mut e = engine();
    let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    e.load_network(&network(&[(a, "a"), (b, "b"), (c, "c")], &[(a, b), (b, c)]), &[], &[]).unwrap();
    let done = record(&mut e, EventKind::LayoutComplete);
    e.start_layout();
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut result = None;
    while result.is_none() && Instant::now() < deadline {
        result = e.poll_layout();
        std::thread::sleep(Duration::from_millis(5));
    }
    let result = result.expect("layout finished");
    assert!(e.graph().nodes().iter().all(|n| n.placed));
    assert_eq!(e.graph().node(a).map(|n| n.position), result.position_of(a));
    assert_eq!(done.lock().unwrap().len(), 1);
}

#[test]
fn snapshot_restores_positions_and_view() {
    let dir = temp_dir();
    let s = EngineSettings { autosave_override: Some(dir.clone()), ..settings() };
    let mut e = Engine::new(s, 800.0, 600.0).unwrap();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::new(12.0, 34.0)).unwrap();
    e.handle_event(InputEvent::Wheel { pos: Pos2::new(400.0, 300.0), delta: -1.0 });
    let zoom = e.viewport().zoom;
    e.save_snapshot().unwrap();

    e.set_node_position(a, Pos2::new(-500.0, 0.0)).unwrap();
    e.handle_event(InputEvent::Wheel { pos: Pos2::new(400.0, 300.0), delta: 2.0 });
    assert_eq!(e.load_snapshot().unwrap(), Some(1));
    assert_eq!(e.graph().node(a).unwrap().position, Pos2::new(12.0, 34.0));
    assert!((e.viewport().zoom - zoom).abs() < 1e-6);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn versioned_snapshot_is_listed_and_restorable() {
    let dir = temp_dir();
    let s = EngineSettings { autosave_override: Some(dir.clone()), ..settings() };
    let mut e = Engine::new(s, 800.0, 600.0).unwrap();
    let a = Uuid::now_v7();
    e.load_network(&network(&[(a, "a")], &[]), &[], &[]).unwrap();
    e.set_node_position(a, Pos2::new(5.0, 6.0)).unwrap();
    let path = e.save_snapshot_versioned().unwrap();
    assert_eq!(e.snapshot_versions().unwrap(), vec![path.clone()]);

    e.set_node_position(a, Pos2::new(900.0, 900.0)).unwrap();
    assert_eq!(e.load_snapshot_from(&path).unwrap(), 1);
    assert_eq!(e.graph().node(a).unwrap().position, Pos2::new(5.0, 6.0));
    let _ = std::fs::remove_dir_all(dir);
}
