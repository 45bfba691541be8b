use std::time::{Duration, Instant};

use super::viewport::Viewport;

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Viewport transition sampled once per display tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportAnimation {
    pub from: Viewport,
    pub to: Viewport,
    pub start: Instant,
    pub duration: Duration,
}

impl ViewportAnimation {
    pub fn new(from: Viewport, to: Viewport, start: Instant, duration: Duration) -> Self {
        Self { from, to, start, duration }
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Interpolated viewport; exactly `to` once progress reaches 1.
    pub fn sample(&self, now: Instant) -> Viewport {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        let t = ease_in_out_cubic(p);
        let mut out = self.to;
        out.pan = self.from.pan + (self.to.pan - self.from.pan) * t;
        out.zoom = lerp(self.from.zoom, self.to.zoom, t);
        out.rotation = lerp(self.from.rotation, self.to.rotation, t);
        out
    }
}
