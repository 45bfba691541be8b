//! Pointer/keyboard state machine: select, hover, drag, pan, zoom and animate.

use std::time::{Duration, Instant};

use egui::{Pos2, Rect, Vec2};

use crate::geometry::{Viewport, ViewportAnimation};
use crate::graph_utils::graph::{NodeId, VisualGraph};
use crate::persistence::settings::EngineSettings;
use crate::spatial::{self, HitTarget};

pub mod input;
pub mod selection;

pub use input::{InputEvent, Key, Modifiers};
pub use selection::SelectionState;

#[derive(Clone, Debug, PartialEq)]
pub struct InteractionConfig {
    pub drag_enabled: bool,
    pub pan_enabled: bool,
    pub zoom_step: f32,
    pub click_slop_px: f32,
    pub click_max: Duration,
    pub hit_tolerance_px: f32,
    pub keyboard_pan_step: f32,
    pub pin_dragged_nodes: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for InteractionConfig {
    fn from(s: &EngineSettings) -> Self {
        Self {
            drag_enabled: s.drag_enabled,
            pan_enabled: s.pan_enabled,
            zoom_step: s.zoom_step,
            click_slop_px: s.click_slop_px,
            click_max: s.click_max(),
            hit_tolerance_px: s.hit_tolerance_px,
            keyboard_pan_step: s.keyboard_pan_step,
            pin_dragged_nodes: s.pin_dragged_nodes,
        }
    }
}

/// Where and when the pointer went down, and what was under it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Press {
    pub screen: Pos2,
    pub time: Instant,
    pub modifiers: Modifiers,
    pub target: Option<HitTarget>,
    // the press itself put the node into the selection
    pub selected_on_press: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    Dragging { node_ids: Vec<NodeId>, last_world: Pos2, press: Press, moved: bool },
    Panning { origin_screen: Pos2, pan_at_origin: Vec2, last_screen: Pos2, press: Press },
    // shift or ctrl drag on empty space; the band is in screen pixels
    Selecting { origin: Pos2, current: Pos2, press: Press },
    Animating(ViewportAnimation),
}

/// What the caller should do after an event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    pub repaint: bool,
    pub selection_changed: bool,
    pub hover_changed: bool,
    // newly hovered element worth a tooltip
    pub tooltip: Option<HitTarget>,
    pub nodes_moved: bool,
    pub clear_highlight: bool,
    pub request_overview: bool,
}

pub struct InteractionContext<'a> {
    pub graph: &'a mut VisualGraph,
    pub viewport: &'a mut Viewport,
    pub selection: &'a mut SelectionState,
}

#[derive(Clone, Debug)]
pub struct Interaction {
    pub config: InteractionConfig,
    state: InteractionState,
    // press that started neither a drag nor a pan, still eligible for a click
    idle_press: Option<Press>,
}

impl Interaction {
    pub fn new(config: InteractionConfig) -> Self {
        Self { config, state: InteractionState::Idle, idle_press: None }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, InteractionState::Animating(_))
    }

    /// Screen rectangle of an in-progress box selection.
    pub fn selection_band(&self) -> Option<Rect> {
        match self.state {
            InteractionState::Selecting { origin, current, .. } => Some(Rect::from_two_pos(origin, current)),
            _ => None,
        }
    }

    /// Starts a viewport transition, replacing any animation in flight.
    pub fn animate_to(&mut self, from: Viewport, to: Viewport, now: Instant, duration: Duration) {
        self.idle_press = None;
        self.state = InteractionState::Animating(ViewportAnimation::new(from, to, now, duration));
    }

    /// Samples a running animation into `viewport`. Returns true while something changed.
    pub fn tick(&mut self, now: Instant, viewport: &mut Viewport) -> bool {
        let InteractionState::Animating(anim) = &self.state else {
            return false;
        };
        let s = anim.sample(now);
        viewport.pan = s.pan;
        viewport.zoom = s.zoom;
        viewport.rotation = s.rotation;
        if anim.is_finished(now) {
            self.state = InteractionState::Idle;
        }
        true
    }

    /// Drops any drag, pan or animation without applying further effects.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.idle_press = None;
    }

    pub fn handle(&mut self, event: InputEvent, ctx: &mut InteractionContext<'_>) -> Response {
        match event {
            InputEvent::PointerDown { pos, modifiers, time } => self.pointer_down(pos, modifiers, time, ctx),
            InputEvent::PointerMove { pos, .. } => self.pointer_move(pos, ctx),
            InputEvent::PointerUp { pos, modifiers, time } => self.pointer_up(pos, modifiers, time, ctx),
            InputEvent::Wheel { pos, delta } => self.wheel(pos, delta, ctx),
            InputEvent::Key { key, .. } => self.key(key, ctx),
            InputEvent::PointerLeave => self.pointer_leave(ctx),
        }
    }

    fn pointer_down(&mut self, pos: Pos2, modifiers: Modifiers, time: Instant, ctx: &mut InteractionContext<'_>) -> Response {
        let mut resp = Response::default();
        if self.is_animating() {
            // viewport keeps whatever the last tick sampled
            self.state = InteractionState::Idle;
        }
        let target = spatial::hit_test(ctx.viewport, ctx.graph, pos, self.config.hit_tolerance_px);
        let mut press = Press { screen: pos, time, modifiers, target, selected_on_press: false };

        match target {
            Some(HitTarget::Node(id)) if self.config.drag_enabled => {
                if !ctx.selection.is_node_selected(id) {
                    if modifiers.shift {
                        ctx.selection.add_node(id);
                    } else {
                        ctx.selection.select_node(id);
                    }
                    press.selected_on_press = true;
                    resp.selection_changed = true;
                    resp.repaint = true;
                }
                let node_ids: Vec<NodeId> = ctx.selection.selected_nodes().to_vec();
                ctx.graph.bring_to_front(id);
                self.state = InteractionState::Dragging {
                    node_ids,
                    last_world: ctx.viewport.screen_to_world(pos),
                    press,
                    moved: false,
                };
            }
            Some(HitTarget::Node(_)) => self.idle_press = Some(press),
            None if modifiers.shift || modifiers.ctrl => {
                self.state = InteractionState::Selecting { origin: pos, current: pos, press };
            }
            _ if self.config.pan_enabled => {
                self.state = InteractionState::Panning {
                    origin_screen: pos,
                    pan_at_origin: ctx.viewport.pan,
                    last_screen: pos,
                    press,
                };
            }
            _ => self.idle_press = Some(press),
        }
        resp
    }

    fn pointer_move(&mut self, pos: Pos2, ctx: &mut InteractionContext<'_>) -> Response {
        let mut resp = Response::default();
        let slop = self.config.click_slop_px;
        let pin = self.config.pin_dragged_nodes;
        match &mut self.state {
            InteractionState::Dragging { node_ids, last_world, press, moved } => {
                if !*moved && (pos - press.screen).length() <= slop {
                    return resp;
                }
                *moved = true;
                let world = ctx.viewport.screen_to_world(pos);
                let delta = world - *last_world;
                *last_world = world;
                for id in node_ids.iter() {
                    if ctx.graph.translate_node(*id, delta)
                        && pin
                        && let Some(n) = ctx.graph.node_mut(*id)
                    {
                        n.pinned = true;
                    }
                }
                resp.nodes_moved = true;
                resp.repaint = true;
            }
            InteractionState::Panning { origin_screen, pan_at_origin, last_screen, .. } => {
                ctx.viewport.pan = *pan_at_origin + (pos - *origin_screen);
                *last_screen = pos;
                resp.repaint = true;
            }
            InteractionState::Selecting { current, .. } => {
                *current = pos;
                resp.repaint = true;
            }
            InteractionState::Idle => {
                if self.idle_press.is_some_and(|p| (pos - p.screen).length() > slop) {
                    self.idle_press = None;
                }
                let hit = spatial::hit_test(ctx.viewport, ctx.graph, pos, self.config.hit_tolerance_px);
                let changed = match hit {
                    Some(HitTarget::Node(id)) => ctx.selection.set_hovered_node(Some(id)),
                    Some(HitTarget::Edge(id)) => ctx.selection.set_hovered_edge(Some(id)),
                    None => ctx.selection.clear_hover(),
                };
                if changed {
                    resp.hover_changed = true;
                    resp.repaint = true;
                    resp.tooltip = hit;
                }
            }
            InteractionState::Animating(_) => {}
        }
        resp
    }

    fn pointer_up(&mut self, pos: Pos2, modifiers: Modifiers, time: Instant, ctx: &mut InteractionContext<'_>) -> Response {
        let mut resp = Response::default();
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let press = match state {
            InteractionState::Dragging { press, moved, .. } => {
                resp.repaint = true;
                if moved {
                    resp.nodes_moved = true;
                    None
                } else {
                    Some(press)
                }
            }
            InteractionState::Panning { press, .. } => {
                resp.repaint = true;
                Some(press)
            }
            InteractionState::Selecting { origin, press, .. } => {
                resp.repaint = true;
                if (pos - origin).length() <= self.config.click_slop_px {
                    Some(press)
                } else {
                    let band = Rect::from_two_pos(origin, pos);
                    let picked = spatial::nodes_in_screen_rect(ctx.viewport, ctx.graph, band);
                    // ctrl alone replaces the selection, shift adds to it
                    let additive = modifiers.shift || press.modifiers.shift;
                    let before = (ctx.selection.selected_nodes().to_vec(), ctx.selection.selected_edges().to_vec());
                    if !additive {
                        ctx.selection.clear();
                    }
                    for id in picked {
                        ctx.selection.add_node(id);
                    }
                    resp.selection_changed =
                        before != (ctx.selection.selected_nodes().to_vec(), ctx.selection.selected_edges().to_vec());
                    None
                }
            }
            InteractionState::Idle => self.idle_press.take(),
            InteractionState::Animating(anim) => {
                self.state = InteractionState::Animating(anim);
                None
            }
        };
        self.idle_press = None;

        let Some(press) = press else {
            return resp;
        };
        let is_click = (pos - press.screen).length() <= self.config.click_slop_px
            && time.saturating_duration_since(press.time) <= self.config.click_max;
        if !is_click {
            return resp;
        }
        let shift = modifiers.shift || press.modifiers.shift;
        let changed = match press.target {
            Some(HitTarget::Node(id)) => {
                if shift {
                    if !press.selected_on_press {
                        ctx.selection.toggle_node(id);
                    }
                    !press.selected_on_press
                } else if ctx.selection.selected_nodes() == [id] && ctx.selection.selected_edges().is_empty() {
                    false
                } else {
                    ctx.selection.select_node(id);
                    true
                }
            }
            Some(HitTarget::Edge(id)) => {
                if shift {
                    ctx.selection.toggle_edge(id);
                } else {
                    ctx.selection.select_edge(id);
                }
                true
            }
            None => ctx.selection.clear(),
        };
        if changed {
            resp.selection_changed = true;
            resp.repaint = true;
        }
        resp
    }

    fn wheel(&mut self, pos: Pos2, delta: f32, ctx: &mut InteractionContext<'_>) -> Response {
        if !delta.is_finite() {
            return Response::default();
        }
        if self.is_animating() {
            self.state = InteractionState::Idle;
        }
        ctx.viewport.zoom_by(pos, self.config.zoom_step.powf(-delta));
        // keep an active pan continuous from the zoomed viewport
        if let InteractionState::Panning { origin_screen, pan_at_origin, last_screen, .. } = &mut self.state {
            *origin_screen = *last_screen;
            *pan_at_origin = ctx.viewport.pan;
        }
        Response { repaint: true, ..Response::default() }
    }

    fn key(&mut self, key: Key, ctx: &mut InteractionContext<'_>) -> Response {
        let mut resp = Response { repaint: true, ..Response::default() };
        let step = self.config.keyboard_pan_step;
        let navigates = !matches!(key, Key::Escape | Key::ResetView);
        if navigates && self.is_animating() {
            // the next tick would overwrite the keyed change
            self.state = InteractionState::Idle;
        }
        match key {
            Key::Escape => {
                resp.selection_changed = ctx.selection.clear();
                resp.clear_highlight = true;
            }
            Key::ArrowLeft => ctx.viewport.pan_by(Vec2::new(step, 0.0)),
            Key::ArrowRight => ctx.viewport.pan_by(Vec2::new(-step, 0.0)),
            Key::ArrowUp => ctx.viewport.pan_by(Vec2::new(0.0, step)),
            Key::ArrowDown => ctx.viewport.pan_by(Vec2::new(0.0, -step)),
            Key::ZoomIn => ctx.viewport.zoom_by(ctx.viewport.center(), self.config.zoom_step),
            Key::ZoomOut => ctx.viewport.zoom_by(ctx.viewport.center(), 1.0 / self.config.zoom_step),
            Key::ResetView => resp.request_overview = true,
        }
        resp
    }

    fn pointer_leave(&mut self, ctx: &mut InteractionContext<'_>) -> Response {
        let mut resp = Response::default();
        if matches!(
            self.state,
            InteractionState::Dragging { .. } | InteractionState::Panning { .. } | InteractionState::Selecting { .. }
        ) {
            if let InteractionState::Dragging { moved: true, .. } = self.state {
                resp.nodes_moved = true;
            }
            self.state = InteractionState::Idle;
            resp.repaint = true;
        }
        self.idle_press = None;
        if ctx.selection.clear_hover() {
            resp.hover_changed = true;
            resp.repaint = true;
        }
        resp
    }
}
