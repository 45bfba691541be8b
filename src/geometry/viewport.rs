use egui::{Pos2, Rect, Vec2};

use crate::error::EngineError;

/// Affine view transform: `screen = R(world * zoom) + pan`.
///
/// Zoom is always kept inside `[zoom_min, zoom_max]`. Width and height are the
/// logical size of the drawing surface in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
}

fn valid_extent(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn rotate(v: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

impl Viewport {
    /// Creates an unrotated viewport at zoom 1 with the world origin in the top-left corner.
    pub fn new(width: f32, height: f32, zoom_min: f32, zoom_max: f32) -> Result<Self, EngineError> {
        if !valid_extent(width) || !valid_extent(height) {
            return Err(EngineError::Surface { width, height });
        }
        let (zoom_min, zoom_max) = if zoom_min <= zoom_max { (zoom_min, zoom_max) } else { (zoom_max, zoom_min) };
        Ok(Self {
            pan: Vec2::ZERO,
            zoom: 1.0_f32.clamp(zoom_min, zoom_max),
            rotation: 0.0,
            width,
            height,
            zoom_min,
            zoom_max,
        })
    }

    pub fn world_to_screen(&self, p: Pos2) -> Pos2 {
        (rotate(p.to_vec2() * self.zoom, self.rotation) + self.pan).to_pos2()
    }

    pub fn screen_to_world(&self, s: Pos2) -> Pos2 {
        (rotate(s.to_vec2() - self.pan, -self.rotation) / self.zoom).to_pos2()
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        if !zoom.is_finite() {
            return self.zoom;
        }
        zoom.clamp(self.zoom_min, self.zoom_max)
    }

    /// Sets a new zoom while keeping the world point under `pivot` fixed on screen.
    pub fn zoom_at(&mut self, pivot: Pos2, new_zoom: f32) {
        let new_zoom = self.clamp_zoom(new_zoom);
        let ratio = new_zoom / self.zoom;
        let pivot = pivot.to_vec2();
        self.pan = pivot - (pivot - self.pan) * ratio;
        self.zoom = new_zoom;
    }

    pub fn zoom_by(&mut self, pivot: Pos2, factor: f32) {
        self.zoom_at(pivot, self.zoom * factor);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), EngineError> {
        if !valid_extent(width) || !valid_extent(height) {
            return Err(EngineError::Surface { width, height });
        }
        // Keep the world point at the old center in the new center
        let anchor = self.screen_to_world(self.center());
        self.width = width;
        self.height = height;
        self.center_on(anchor);
        Ok(())
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(self.width, self.height))
    }

    /// World-space bounding box of everything currently on screen.
    pub fn visible_world_rect(&self) -> Rect {
        let r = self.screen_rect();
        let corners = [r.left_top(), r.right_top(), r.left_bottom(), r.right_bottom()];
        let mut out = Rect::NOTHING;
        for c in corners {
            out.extend_with(self.screen_to_world(c));
        }
        out
    }

    /// Moves the pan so that `world` lands in the middle of the surface.
    pub fn center_on(&mut self, world: Pos2) {
        self.pan = self.center().to_vec2() - rotate(world.to_vec2() * self.zoom, self.rotation);
    }

    pub fn centered_on(&self, world: Pos2) -> Self {
        let mut out = *self;
        out.center_on(world);
        out
    }

    /// Viewport framing `bounds` with `padding` screen pixels on every side.
    ///
    /// Degenerate bounds (a single point) keep the current zoom and only recenter.
    pub fn fit_bounds(&self, bounds: Rect, padding: f32) -> Self {
        let mut out = *self;
        if !bounds.is_finite() || bounds.is_negative() {
            return out;
        }
        let avail_w = (self.width - 2.0 * padding).max(1.0);
        let avail_h = (self.height - 2.0 * padding).max(1.0);
        let (bw, bh) = (bounds.width(), bounds.height());
        if bw > f32::EPSILON || bh > f32::EPSILON {
            let zx = if bw > f32::EPSILON { avail_w / bw } else { f32::INFINITY };
            let zy = if bh > f32::EPSILON { avail_h / bh } else { f32::INFINITY };
            out.zoom = self.clamp_zoom(zx.min(zy));
        }
        out.center_on(bounds.center());
        out
    }
}
