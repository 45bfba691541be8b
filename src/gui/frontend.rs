use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, StrokeKind};
use log::warn;

use mind_loom::engine::{ExportFormat, ExportOptions, VisualizationMode};
use mind_loom::events::{EngineEvent, EventKind};
use mind_loom::graph_utils::stats::GraphStatistics;
use mind_loom::interaction::{InputEvent, Key, Modifiers};
use mind_loom::layout::{CircularParams, ForceParams, HierarchicalParams, LayoutAlgorithm, RadialParams};
use mind_loom::Engine;

use super::painter;

const MAX_ERRORS: usize = 5;

fn layout_presets() -> [(LayoutAlgorithm, &'static str); 4] {
    [
        (LayoutAlgorithm::ForceDirected(ForceParams::default()), "Force-directed"),
        (LayoutAlgorithm::Hierarchical(HierarchicalParams::default()), "Hierarchical"),
        (LayoutAlgorithm::Circular(CircularParams::default()), "Circular"),
        (LayoutAlgorithm::Radial(RadialParams::default()), "Radial"),
    ]
}

fn modifiers(m: &egui::Modifiers) -> Modifiers {
    Modifiers { shift: m.shift, ctrl: m.ctrl || m.command, alt: m.alt }
}

fn key(k: egui::Key) -> Option<Key> {
    Some(match k {
        egui::Key::Escape => Key::Escape,
        egui::Key::ArrowLeft => Key::ArrowLeft,
        egui::Key::ArrowRight => Key::ArrowRight,
        egui::Key::ArrowUp => Key::ArrowUp,
        egui::Key::ArrowDown => Key::ArrowDown,
        egui::Key::Plus | egui::Key::Equals => Key::ZoomIn,
        egui::Key::Minus => Key::ZoomOut,
        egui::Key::Num0 | egui::Key::Home => Key::ResetView,
        _ => return None,
    })
}

pub struct MindLoomApp {
    engine: Engine,
    sidebar_open: bool,
    search: String,
    search_hits: Option<usize>,
    export_format: ExportFormat,
    stats: Option<GraphStatistics>,
    status: Option<String>,
    // filled by the Error listener
    errors: Arc<Mutex<Vec<String>>>,
    last_canvas_rect: Option<Rect>,
    pointer_inside: bool,
    pointer_down: bool,
}

impl MindLoomApp {
    pub fn new(mut engine: Engine) -> Self {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        engine.on(EventKind::Error, move |ev| {
            if let EngineEvent::Error { message } = ev {
                let mut v = sink.lock().map_err(|_| anyhow::anyhow!("error log poisoned"))?;
                v.push(message.clone());
                let extra = v.len().saturating_sub(MAX_ERRORS);
                v.drain(..extra);
            }
            Ok(())
        });
        Self {
            engine,
            sidebar_open: true,
            search: String::new(),
            search_hits: None,
            export_format: ExportFormat::Json,
            stats: None,
            status: None,
            errors,
            last_canvas_rect: None,
            pointer_inside: false,
            pointer_down: false,
        }
    }

    fn save_snapshot(&mut self, versioned: bool) {
        let res = if versioned { self.engine.save_snapshot_versioned() } else { self.engine.save_snapshot() };
        self.status = Some(match res {
            Ok(p) => format!("Saved {}", p.display()),
            Err(e) => format!("Save failed: {:#}", e),
        });
    }

    fn restore_snapshot(&mut self) {
        self.status = Some(match self.engine.load_snapshot() {
            Ok(Some(n)) => format!("Restored {} node positions", n),
            Ok(None) => "No saved layout".to_string(),
            Err(e) => format!("Restore failed: {:#}", e),
        });
    }

    fn restore_version(&mut self, path: &Path) {
        self.status = Some(match self.engine.load_snapshot_from(path) {
            Ok(n) => format!("Restored {} node positions from {}", n, path.display()),
            Err(e) => format!("Restore failed: {:#}", e),
        });
    }

    fn export(&mut self) {
        let opts = ExportOptions { fit_to_graph: true, ..ExportOptions::new(self.export_format) };
        self.status = Some(match self.engine.export_to_path(&opts, None) {
            Ok(paths) => match paths.first() {
                Some(p) if paths.len() == 1 => format!("Exported {}", p.display()),
                _ => format!("Exported {} files", paths.len()),
            },
            Err(e) => format!("Export failed: {:#}", e),
        });
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        let save = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
        let save_as = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S);
        if ctx.input_mut(|i| i.consume_shortcut(&save_as)) {
            self.save_snapshot(true);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&save)) {
            self.save_snapshot(false);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Mind-Loom");
                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("Save Layout").shortcut_text(ctx.format_shortcut(&save))).clicked() {
                        self.save_snapshot(false);
                        ui.close();
                    }
                    if ui.add(egui::Button::new("Save Layout Version").shortcut_text(ctx.format_shortcut(&save_as))).clicked() {
                        self.save_snapshot(true);
                        ui.close();
                    }
                    if ui.button("Restore Layout").clicked() {
                        self.restore_snapshot();
                        ui.close();
                    }
                    ui.menu_button("Restore Version", |ui| {
                        let versions = self.engine.snapshot_versions().unwrap_or_default();
                        if versions.is_empty() {
                            ui.weak("No saved versions");
                        }
                        for path in versions.iter().take(10) {
                            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("?");
                            if ui.button(name).clicked() {
                                self.restore_version(path);
                                ui.close();
                            }
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Overview").clicked() {
                        self.engine.show_overview();
                        ui.close();
                    }
                    let toggle = if self.sidebar_open { "Hide Sidebar" } else { "Show Sidebar" };
                    if ui.button(toggle).clicked() {
                        self.sidebar_open = !self.sidebar_open;
                        ui.close();
                    }
                });
                ui.small(format!(
                    "N:{} E:{} {:.2}x",
                    self.engine.graph().node_count(),
                    self.engine.graph().edge_count(),
                    self.engine.viewport().zoom
                ));
                if let Some(s) = &self.status {
                    ui.separator();
                    ui.small(s);
                }
            });
        });
    }

    fn sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tooling_sidebar").resizable(true).default_width(260.0).show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                ui.heading("Search");
                if ui.text_edit_singleline(&mut self.search).changed() {
                    let hits = self.engine.search_nodes(&self.search);
                    self.search_hits = (!self.search.trim().is_empty()).then_some(hits.len());
                }
                if let Some(n) = self.search_hits {
                    ui.small(format!("{} match(es)", n));
                }
                ui.separator();

                egui::CollapsingHeader::new("Layout").default_open(true).show(ui, |ui| {
                    let current = self.engine.layout_algorithm().name();
                    for (algo, label) in layout_presets() {
                        if ui.selectable_label(current == algo.name(), label).clicked() {
                            self.engine.set_layout_algorithm(algo);
                        }
                    }
                    ui.horizontal(|ui| {
                        if self.engine.is_layout_running() {
                            ui.spinner();
                            if ui.button("Cancel").clicked() {
                                self.engine.cancel_layout();
                            }
                        } else if ui.button("Run layout").clicked() {
                            self.engine.start_layout();
                        }
                    });
                    if let Some(r) = self.engine.last_layout() {
                        ui.small(format!("{:?} after {} iterations", r.termination, r.iterations));
                    }
                });

                egui::CollapsingHeader::new("Mode").default_open(true).show(ui, |ui| {
                    for mode in VisualizationMode::ALL {
                        if ui.selectable_label(self.engine.mode() == mode, mode.as_str()).clicked() {
                            self.engine.set_visualization_mode(mode);
                        }
                    }
                });

                self.selection_panel(ui);

                egui::CollapsingHeader::new("Statistics").default_open(false).show(ui, |ui| {
                    if ui.button("Refresh").clicked() || self.stats.is_none() {
                        self.stats = Some(self.engine.calculate_statistics());
                    }
                    if let Some(s) = &self.stats {
                        ui.small(format!("nodes {}  edges {}", s.node_count, s.edge_count));
                        ui.small(format!("density {:.3}  avg degree {:.2}", s.density, s.average_degree));
                        ui.small(format!("components {}  isolated {}", s.connected_components, s.isolated_nodes));
                        for (kind, n) in &s.type_distribution {
                            ui.small(format!("{}: {}", kind, n));
                        }
                    }
                });

                egui::CollapsingHeader::new("Export").default_open(false).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut self.export_format, ExportFormat::Json, "JSON");
                        ui.radio_value(&mut self.export_format, ExportFormat::Svg, "SVG");
                        ui.radio_value(&mut self.export_format, ExportFormat::Csv, "CSV");
                    });
                    if ui.button("Export").clicked() {
                        self.export();
                    }
                    ui.small(self.engine.settings().export_dir().display().to_string());
                });

                let errors = self.errors.lock().map(|v| v.clone()).unwrap_or_default();
                if !errors.is_empty() {
                    ui.separator();
                    for e in errors.iter().rev() {
                        ui.colored_label(Color32::RED, e);
                    }
                }
            });
        });
    }

    fn selection_panel(&mut self, ui: &mut egui::Ui) {
        let Some(&id) = self.engine.selection().selected_nodes().first() else {
            return;
        };
        let Some(node) = self.engine.graph().node(id) else {
            return;
        };
        let (label, kind, content, mut pinned) = (node.label.clone(), node.kind.as_str(), node.content.clone(), node.pinned);
        let count = self.engine.selection().selected_nodes().len();
        egui::CollapsingHeader::new("Selection").default_open(true).show(ui, |ui| {
            if count > 1 {
                ui.small(format!("{} nodes selected", count));
            }
            ui.strong(label);
            ui.small(kind);
            if !content.is_empty() {
                ui.label(content);
            }
            if ui.checkbox(&mut pinned, "Pinned").changed()
                && let Err(e) = self.engine.set_node_pinned(id, pinned)
            {
                warn!("pin failed: {}", e);
            }
            ui.horizontal(|ui| {
                if ui.button("Focus").clicked()
                    && let Err(e) = self.engine.focus_on_node(id, self.engine.settings().animation_duration())
                {
                    warn!("focus failed: {}", e);
                }
                if ui.button("Remove").clicked()
                    && let Err(e) = self.engine.remove_node(id)
                {
                    warn!("remove failed: {}", e);
                }
            });
        });
    }

    /// Maps this frame's raw egui input into engine input relative to the canvas.
    fn canvas_input(&mut self, ctx: &egui::Context, rect: Rect) -> Vec<InputEvent> {
        let origin = rect.min.to_vec2();
        let local = |p: Pos2| p - origin;
        let now = Instant::now();
        let typing = ctx.wants_keyboard_input();
        let hover = ctx.pointer_hover_pos();
        let mut out = Vec::new();
        for ev in ctx.input(|i| i.events.clone()) {
            match ev {
                egui::Event::PointerButton { pos, button: egui::PointerButton::Primary, pressed, modifiers: m, .. } => {
                    if pressed && rect.contains(pos) {
                        self.pointer_down = true;
                        out.push(InputEvent::PointerDown { pos: local(pos), modifiers: modifiers(&m), time: now });
                    } else if !pressed && self.pointer_down {
                        self.pointer_down = false;
                        out.push(InputEvent::PointerUp { pos: local(pos), modifiers: modifiers(&m), time: now });
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    if rect.contains(pos) || self.pointer_down {
                        self.pointer_inside = true;
                        out.push(InputEvent::PointerMove { pos: local(pos), time: now });
                    } else if self.pointer_inside {
                        self.pointer_inside = false;
                        out.push(InputEvent::PointerLeave);
                    }
                }
                egui::Event::PointerGone => {
                    self.pointer_inside = false;
                    out.push(InputEvent::PointerLeave);
                }
                egui::Event::MouseWheel { unit, delta, .. } => {
                    if let Some(p) = hover
                        && rect.contains(p)
                    {
                        let notches = match unit {
                            egui::MouseWheelUnit::Line => delta.y,
                            egui::MouseWheelUnit::Page => delta.y * 3.0,
                            egui::MouseWheelUnit::Point => delta.y / 50.0,
                        };
                        if notches != 0.0 {
                            out.push(InputEvent::Wheel { pos: local(p), delta: -notches });
                        }
                    }
                }
                egui::Event::Key { key: k, pressed: true, modifiers: m, .. } if !typing => {
                    if let Some(k) = key(k) {
                        out.push(InputEvent::Key { key: k, modifiers: modifiers(&m) });
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            if self.last_canvas_rect.map(|r| r.size()) != Some(rect.size())
                && let Err(e) = self.engine.resize(rect.width(), rect.height())
            {
                warn!("canvas resize ignored: {}", e);
            }
            self.last_canvas_rect = Some(rect);

            let resp = ui.allocate_rect(rect, Sense::click_and_drag());
            for ev in self.canvas_input(ctx, rect) {
                if self.engine.handle_event(ev).repaint {
                    ctx.request_repaint();
                }
            }

            let canvas_painter = ui.painter_at(rect);
            painter::paint(&canvas_painter, rect.min, &self.engine.render());
            if let Some(band) = self.engine.selection_band() {
                let band = band.translate(rect.min.to_vec2());
                canvas_painter.rect_filled(band, 0.0, Color32::from_rgba_unmultiplied(120, 160, 255, 30));
                canvas_painter.rect_stroke(band, 0.0, Stroke::new(1.0, Color32::from_rgb(120, 160, 255)), StrokeKind::Inside);
            }

            let graph = self.engine.graph();
            let hovered_node = self.engine.selection().hovered_node().and_then(|id| graph.node(id));
            let hovered_edge = self.engine.selection().hovered_edge().and_then(|id| graph.edge(id));
            if let Some(n) = hovered_node {
                resp.on_hover_ui_at_pointer(|ui| {
                    ui.strong(&n.label);
                    ui.small(format!("{} · degree {}", n.kind.as_str(), n.metrics.degree));
                    if !n.content.is_empty() {
                        ui.label(&n.content);
                    }
                });
            } else if let Some(e) = hovered_edge {
                let name = |id| graph.node(id).map(|n| n.label.as_str()).unwrap_or("?");
                resp.on_hover_ui_at_pointer(|ui| {
                    ui.strong(format!("{} → {}", name(e.source), name(e.target)));
                    ui.small(format!("{} · strength {:.2}", e.kind.as_str(), e.strength));
                });
            }
        });
    }
}

impl eframe::App for MindLoomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.engine.tick(Instant::now()) {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
        self.top_bar(ctx);
        if self.sidebar_open {
            self.sidebar(ctx);
        }
        self.canvas(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.engine.save_snapshot() {
            warn!("failed to save layout on exit: {:#}", e);
        }
    }
}
