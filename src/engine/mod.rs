//! The engine facade: owns the graph arena, viewport, selection, interaction
//! state and event bus, and sequences load → layout → render.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use egui::{Pos2, Rect};
use log::{debug, info, warn};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus, EventKind, SubscriptionId};
use crate::geometry::Viewport;
use crate::graph_utils::convert::{build_visual_graph, ConversionReport, ConvertOptions};
use crate::graph_utils::graph::{EdgeId, NodeId, VisualGraph, VisualNode};
use crate::graph_utils::network::{ConnectionDiscovery, KnowledgeItem, Network, Thought};
use crate::graph_utils::stats::{calculate_statistics, GraphStatistics};
use crate::interaction::{InputEvent, Interaction, InteractionConfig, InteractionContext, Response, SelectionState};
use crate::layout::job::LayoutJob;
use crate::layout::{compute_layout, inputs_from_graph, LayoutAlgorithm, LayoutConfig, LayoutResult, Termination};
use crate::persistence::persist::{self, LayoutSnapshot};
use crate::persistence::settings::EngineSettings;
use crate::render::{self, DisplayList, RenderStyle};
use crate::spatial::HitTarget;

pub mod export;
pub mod modes;

pub use export::{ExportFormat, ExportOptions, ExportOutput};
pub use modes::VisualizationMode;

/// A converted graph waiting to be committed, tagged with the load that produced it.
#[derive(Debug)]
pub struct PreparedGraph {
    generation: u64,
    pub graph: VisualGraph,
    pub report: ConversionReport,
}

impl PreparedGraph {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues load tickets. Only the most recently issued ticket may be committed,
/// so overlapping loads resolve last-call-wins regardless of completion order.
#[derive(Clone, Debug)]
pub struct GraphLoader {
    latest: Arc<AtomicU64>,
    options: ConvertOptions,
}

impl GraphLoader {
    fn new(options: ConvertOptions) -> Self {
        Self { latest: Arc::new(AtomicU64::new(0)), options }
    }

    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.latest() == generation
    }

    pub fn prepare_network(
        &self,
        generation: u64,
        network: &Network,
        thoughts: &[Thought],
        knowledge: &[KnowledgeItem],
    ) -> PreparedGraph {
        let (graph, report) = build_visual_graph(network, thoughts, knowledge, &self.options);
        PreparedGraph { generation, graph, report }
    }

    /// Runs connection discovery and converts its network. The ticket is taken
    /// before discovery starts, so a later call supersedes this one.
    pub async fn prepare(
        &self,
        discovery: &dyn ConnectionDiscovery,
        thoughts: &[Thought],
        knowledge: &[KnowledgeItem],
    ) -> anyhow::Result<PreparedGraph> {
        let generation = self.begin();
        let network = discovery.discover(thoughts, knowledge).await?;
        Ok(self.prepare_network(generation, &network, thoughts, knowledge))
    }
}

pub struct Engine {
    settings: EngineSettings,
    graph: VisualGraph,
    viewport: Viewport,
    selection: SelectionState,
    interaction: Interaction,
    events: EventBus,
    style: RenderStyle,
    loader: GraphLoader,
    // generation of the graph currently shown
    generation: u64,
    layout: LayoutAlgorithm,
    layout_job: Option<LayoutJob>,
    last_layout: Option<LayoutResult>,
    last_report: ConversionReport,
    mode: VisualizationMode,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("generation", &self.generation)
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("viewport", &self.viewport)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Engine {
    /// Fails fast when the drawing surface has no usable size.
    pub fn new(settings: EngineSettings, width: f32, height: f32) -> Result<Self, EngineError> {
        let settings = settings.sanitized();
        let mut viewport = Viewport::new(width, height, settings.zoom_min, settings.zoom_max)?;
        viewport.center_on(Pos2::ZERO);
        let options = ConvertOptions {
            base_radius: settings.base_node_radius,
            importance_radius_scale: settings.importance_radius_scale,
            center: Pos2::ZERO,
        };
        Ok(Self {
            interaction: Interaction::new(InteractionConfig::from(&settings)),
            style: RenderStyle::from_settings(&settings),
            layout: settings.default_layout.clone(),
            loader: GraphLoader::new(options),
            settings,
            graph: VisualGraph::new(),
            viewport,
            selection: SelectionState::new(),
            events: EventBus::new(),
            generation: 0,
            layout_job: None,
            last_layout: None,
            last_report: ConversionReport::default(),
            mode: VisualizationMode::Overview,
        })
    }

    // Accessors
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn graph(&self) -> &VisualGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Screen rectangle of a box selection being dragged out, if any.
    pub fn selection_band(&self) -> Option<Rect> {
        self.interaction.selection_band()
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    pub fn layout_algorithm(&self) -> &LayoutAlgorithm {
        &self.layout
    }

    pub fn set_layout_algorithm(&mut self, algorithm: LayoutAlgorithm) {
        self.layout = algorithm;
    }

    pub fn last_layout(&self) -> Option<&LayoutResult> {
        self.last_layout.as_ref()
    }

    pub fn last_report(&self) -> &ConversionReport {
        &self.last_report
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // Events
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    fn emit(&mut self, event: EngineEvent) {
        self.events.emit(&event);
    }

    fn emit_selection(&mut self) {
        self.selection.apply_to(&mut self.graph);
        let event = EngineEvent::SelectionChanged {
            nodes: self.selection.selected_nodes().to_vec(),
            edges: self.selection.selected_edges().to_vec(),
        };
        self.emit(event);
    }

    // Loading
    pub fn loader(&self) -> GraphLoader {
        self.loader.clone()
    }

    /// Applies a prepared graph unless a newer load has been started since.
    /// Returns whether the graph was replaced.
    pub fn commit_load(&mut self, prepared: PreparedGraph) -> Result<bool, EngineError> {
        if !self.loader.is_current(prepared.generation) {
            debug!("discarding superseded load {} (latest {})", prepared.generation, self.loader.latest());
            return Ok(false);
        }
        self.cancel_layout();
        let PreparedGraph { generation, mut graph, report } = prepared;

        // Warm start: surviving ids keep their position and pin
        let mut reused = 0;
        for node in graph.nodes_mut() {
            if let Some(old) = self.graph.node(node.id)
                && old.placed
            {
                node.position = old.position;
                node.placed = true;
                node.pinned = old.pinned;
                reused += 1;
            }
        }

        self.graph = graph;
        self.generation = generation;
        self.last_layout = None;
        self.interaction.reset();
        let selection_shrank = self.selection.retain_loaded(&self.graph);
        self.selection.apply_to(&mut self.graph);
        info!(
            "loaded graph {}: {} nodes, {} edges ({} skipped, {} warm-started)",
            generation,
            self.graph.node_count(),
            self.graph.edge_count(),
            report.skipped_nodes + report.skipped_edges,
            reused
        );
        let loaded = EngineEvent::DataLoaded {
            generation,
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            skipped: report.skipped_nodes + report.skipped_edges,
        };
        self.last_report = report;
        if selection_shrank {
            self.emit_selection();
        }
        self.emit(loaded);

        if self.settings.layout_on_load && !self.graph.is_empty() {
            self.run_layout();
            if let Some(b) = self.graph.bounds() {
                self.viewport = self.viewport.fit_bounds(b, self.settings.fit_padding);
            }
        }
        Ok(true)
    }

    /// Synchronous load of an already discovered network.
    pub fn load_network(
        &mut self,
        network: &Network,
        thoughts: &[Thought],
        knowledge: &[KnowledgeItem],
    ) -> Result<bool, EngineError> {
        let generation = self.loader.begin();
        let prepared = self.loader.prepare_network(generation, network, thoughts, knowledge);
        self.commit_load(prepared)
    }

    /// Runs discovery and replaces the graph. On failure an `Error` event is
    /// emitted and the previous graph stays in place.
    pub async fn load_graph_data(
        &mut self,
        discovery: &dyn ConnectionDiscovery,
        thoughts: &[Thought],
        knowledge: &[KnowledgeItem],
    ) -> Result<bool, EngineError> {
        let loader = self.loader();
        match loader.prepare(discovery, thoughts, knowledge).await {
            Ok(prepared) => self.commit_load(prepared),
            Err(e) => {
                let message = format!("{:#}", e);
                warn!("graph load failed: {}", message);
                self.emit(EngineEvent::Error { message: message.clone() });
                Err(EngineError::Load(message))
            }
        }
    }

    // Layout
    fn layout_config(&self) -> LayoutConfig {
        LayoutConfig { center: Pos2::ZERO }
    }

    fn refresh_degrees(&mut self) {
        let degrees = self.graph.degrees();
        for n in self.graph.nodes_mut() {
            n.metrics.degree = degrees.get(&n.id).copied().unwrap_or(0);
        }
    }

    fn apply_layout(&mut self, result: &LayoutResult) {
        for (id, p) in &result.positions {
            if let Some(n) = self.graph.node_mut(*id) {
                // nodes pinned while a background run was in flight keep their spot
                if !n.pinned {
                    n.position = *p;
                }
                n.placed = true;
            }
        }
        self.refresh_degrees();
        self.last_layout = Some(result.clone());
        self.emit(EngineEvent::LayoutComplete {
            algorithm: self.layout.name(),
            iterations: result.iterations,
            termination: result.termination,
        });
    }

    /// Runs the current layout algorithm on this thread and applies it.
    pub fn run_layout(&mut self) -> LayoutResult {
        self.cancel_layout();
        let (nodes, edges) = inputs_from_graph(&self.graph);
        let result = compute_layout(&nodes, &edges, &self.layout, &self.layout_config());
        debug!("{} layout: {:?} after {} iterations", self.layout.name(), result.termination, result.iterations);
        self.apply_layout(&result);
        result
    }

    /// Starts the current layout on a worker thread; see [`Engine::poll_layout`].
    pub fn start_layout(&mut self) {
        self.cancel_layout();
        let (nodes, edges) = inputs_from_graph(&self.graph);
        self.layout_job = Some(LayoutJob::spawn(self.generation, nodes, edges, self.layout.clone(), self.layout_config()));
    }

    pub fn is_layout_running(&self) -> bool {
        self.layout_job.is_some()
    }

    pub fn cancel_layout(&mut self) {
        if let Some(job) = self.layout_job.take() {
            debug!("cancelling layout job {}", job.generation());
            job.cancel();
        }
    }

    /// Applies a finished background layout. Results for an older graph or
    /// from a cancelled run are dropped.
    pub fn poll_layout(&mut self) -> Option<LayoutResult> {
        let job = self.layout_job.as_mut()?;
        let Some(outcome) = job.try_result() else {
            if job.is_dead() {
                warn!("layout job {} ended without a result", job.generation());
                self.layout_job = None;
            }
            return None;
        };
        self.layout_job = None;
        if outcome.generation != self.generation || outcome.result.termination == Termination::Cancelled {
            debug!("dropping stale layout result for generation {}", outcome.generation);
            return None;
        }
        self.apply_layout(&outcome.result);
        Some(outcome.result)
    }

    // Highlighting and navigation
    /// Case-insensitive substring match over labels and content. Matches are
    /// highlighted; an empty query clears the highlight.
    pub fn search_nodes(&mut self, query: &str) -> Vec<NodeId> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            self.clear_highlight();
            return Vec::new();
        }
        let hits: Vec<NodeId> = self
            .graph
            .nodes()
            .iter()
            .filter(|n| n.label.to_lowercase().contains(&q) || n.content.to_lowercase().contains(&q))
            .map(|n| n.id)
            .collect();
        self.highlight_nodes(&hits);
        hits
    }

    /// Highlighted nodes get full opacity and everything else is dimmed. Edges stay
    /// lit only when both endpoints are highlighted.
    pub fn highlight_nodes(&mut self, ids: &[NodeId]) {
        let set: HashSet<NodeId> = ids.iter().copied().collect();
        let dim = self.settings.dim_opacity;
        for n in self.graph.nodes_mut() {
            n.highlighted = set.contains(&n.id);
            n.opacity = if n.highlighted { 1.0 } else { dim };
        }
        for e in self.graph.edges_mut() {
            e.highlighted = set.contains(&e.source) && set.contains(&e.target);
            e.opacity = if e.highlighted { 1.0 } else { dim };
        }
    }

    pub fn clear_highlight(&mut self) {
        for n in self.graph.nodes_mut() {
            n.highlighted = false;
            n.opacity = 1.0;
        }
        for e in self.graph.edges_mut() {
            e.highlighted = false;
            e.opacity = 1.0;
        }
    }

    fn animate_viewport(&mut self, target: Viewport, duration: Duration) {
        self.interaction.animate_to(self.viewport, target, Instant::now(), duration);
    }

    /// Animates the node into the middle of the view at the current zoom and
    /// highlights it together with its neighbors.
    pub fn focus_on_node(&mut self, id: NodeId, duration: Duration) -> Result<(), EngineError> {
        let node = self.graph.node(id).ok_or(EngineError::UnknownNode(id))?;
        let target = self.viewport.centered_on(node.position);
        let mut lit = vec![id];
        lit.extend(self.graph.neighbors(id));
        self.highlight_nodes(&lit);
        self.animate_viewport(target, duration);
        Ok(())
    }

    pub fn show_overview(&mut self) {
        if let Some(b) = self.graph.bounds() {
            let target = self.viewport.fit_bounds(b, self.settings.fit_padding);
            self.animate_viewport(target, self.settings.animation_duration());
        }
    }

    /// Switches mode and animates the viewport to frame what the mode shows.
    pub fn set_visualization_mode(&mut self, mode: VisualizationMode) {
        self.mode = mode;
        let ids = modes::framing_ids(mode, &self.graph, &self.selection, self.settings.temporal_window);
        if let Some(b) = self.graph.bounds_of(ids) {
            let target = self.viewport.fit_bounds(b, self.settings.fit_padding);
            self.animate_viewport(target, self.settings.animation_duration());
        }
    }

    pub fn calculate_statistics(&self) -> GraphStatistics {
        calculate_statistics(&self.graph)
    }

    // Output
    pub fn render(&self) -> DisplayList {
        render::render(&self.graph, &self.viewport, &self.selection, &self.style)
    }

    pub fn export(&self, options: &ExportOptions) -> Result<ExportOutput, EngineError> {
        export::export(&self.graph, &self.viewport, &self.selection, &self.style, options)
    }

    /// Writes an export into `dir` (default: the configured export directory).
    /// CSV produces two files, one per table.
    pub fn export_to_path(&self, options: &ExportOptions, dir: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| self.settings.export_dir());
        std::fs::create_dir_all(&dir)?;
        let fmt = format_description!("[year][month][day]_[hour][minute][second]");
        let stamp = OffsetDateTime::now_utc().format(fmt).unwrap_or_else(|_| "unknown".to_string());
        let ext = options.format.extension();
        let mut written = Vec::new();
        match self.export(options)? {
            ExportOutput::Json(s) | ExportOutput::Svg(s) => {
                let path = dir.join(format!("mind-loom_{}.{}", stamp, ext));
                std::fs::write(&path, s)?;
                written.push(path);
            }
            ExportOutput::Csv { nodes, edges } => {
                for (suffix, body) in [("nodes", nodes), ("edges", edges)] {
                    let path = dir.join(format!("mind-loom_{}_{}.{}", stamp, suffix, ext));
                    std::fs::write(&path, body)?;
                    written.push(path);
                }
            }
        }
        info!("exported {} file(s) to {}", written.len(), dir.display());
        Ok(written)
    }

    // Input
    pub fn handle_event(&mut self, event: InputEvent) -> Response {
        let mut ctx = InteractionContext {
            graph: &mut self.graph,
            viewport: &mut self.viewport,
            selection: &mut self.selection,
        };
        let resp = self.interaction.handle(event, &mut ctx);

        if resp.nodes_moved && self.layout_job.is_some() {
            // a background result would fight the user's drag
            self.cancel_layout();
        }
        if resp.clear_highlight {
            self.clear_highlight();
        }
        if resp.selection_changed {
            self.emit_selection();
        } else if resp.hover_changed {
            self.selection.apply_to(&mut self.graph);
        }
        if let Some(target) = resp.tooltip {
            let (node, edge) = match target {
                HitTarget::Node(id) => (Some(id), None),
                HitTarget::Edge(id) => (None, Some(id)),
            };
            self.emit(EngineEvent::TooltipRequested { node, edge });
        }
        if resp.request_overview {
            self.show_overview();
        }
        resp
    }

    /// Advances animation and collects background layout results. Returns true
    /// when the caller should repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        let animating = self.interaction.tick(now, &mut self.viewport);
        let laid_out = self.poll_layout().is_some();
        animating || laid_out || self.layout_job.is_some()
    }

    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), EngineError> {
        self.viewport.resize(width, height)
    }

    // Direct manipulation
    pub fn select_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        if !self.graph.contains_node(id) {
            return Err(EngineError::UnknownNode(id));
        }
        self.selection.select_node(id);
        self.emit_selection();
        Ok(())
    }

    pub fn select_edge(&mut self, id: EdgeId) -> Result<(), EngineError> {
        match self.graph.edge(id) {
            Some(e) if !self.graph.is_dangling(e) => {}
            _ => return Err(EngineError::UnknownEdge(id)),
        }
        self.selection.select_edge(id);
        self.emit_selection();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection();
        }
    }

    /// Removes a node; its edges stay behind as dangling (invisible, inert) records.
    pub fn remove_node(&mut self, id: NodeId) -> Result<VisualNode, EngineError> {
        let node = self.graph.remove_node(id).ok_or(EngineError::UnknownNode(id))?;
        self.refresh_degrees();
        self.interaction.reset();
        if self.selection.retain_loaded(&self.graph) {
            self.emit_selection();
        }
        Ok(node)
    }

    pub fn set_node_position(&mut self, id: NodeId, pos: Pos2) -> Result<(), EngineError> {
        let n = self.graph.node_mut(id).ok_or(EngineError::UnknownNode(id))?;
        n.position = pos;
        n.placed = true;
        Ok(())
    }

    pub fn set_node_pinned(&mut self, id: NodeId, pinned: bool) -> Result<(), EngineError> {
        let n = self.graph.node_mut(id).ok_or(EngineError::UnknownNode(id))?;
        n.pinned = pinned;
        Ok(())
    }

    // Snapshots
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::from_runtime(&self.graph, &self.viewport)
    }

    /// Reapplies saved positions to nodes that still exist plus the saved view.
    /// Returns how many nodes were placed.
    pub fn restore_snapshot(&mut self, snapshot: &LayoutSnapshot) -> usize {
        let mut placed = 0;
        for (id, (pos, pinned)) in snapshot.positions() {
            if let Some(n) = self.graph.node_mut(id)
                && pos.is_finite()
            {
                n.position = pos;
                n.placed = true;
                n.pinned = pinned;
                placed += 1;
            }
        }
        if snapshot.zoom.is_finite() && snapshot.zoom > 0.0 {
            self.viewport.zoom = self.viewport.clamp_zoom(snapshot.zoom);
        }
        let pan = snapshot.pan();
        if pan.is_finite() {
            self.viewport.pan = pan;
        }
        if snapshot.rotation.is_finite() {
            self.viewport.rotation = snapshot.rotation;
        }
        self.interaction.reset();
        placed
    }

    pub fn save_snapshot(&self) -> anyhow::Result<PathBuf> {
        persist::save_active(&self.settings.autosave_dir(), &self.snapshot())
    }

    pub fn save_snapshot_versioned(&self) -> anyhow::Result<PathBuf> {
        persist::save_versioned(&self.settings.autosave_dir(), &self.snapshot())
    }

    /// Versioned snapshots in the autosave directory, newest first.
    pub fn snapshot_versions(&self) -> anyhow::Result<Vec<PathBuf>> {
        persist::list_versions(&self.settings.autosave_dir())
    }

    pub fn load_snapshot_from(&mut self, path: &Path) -> anyhow::Result<usize> {
        let snap = persist::load_from_path(path)?;
        Ok(self.restore_snapshot(&snap))
    }

    /// Loads the active snapshot from the autosave directory, if any.
    pub fn load_snapshot(&mut self) -> anyhow::Result<Option<usize>> {
        match persist::load_active(&self.settings.autosave_dir())? {
            Some(snap) => Ok(Some(self.restore_snapshot(&snap))),
            None => Ok(None),
        }
    }
}
