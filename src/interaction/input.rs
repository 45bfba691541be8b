use std::time::Instant;

use egui::Pos2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Self = Self { shift: true, ctrl: false, alt: false };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    ZoomIn,
    ZoomOut,
    // frame the whole graph
    ResetView,
}

/// Pointer, wheel and keyboard input in surface coordinates (pixels, origin top-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2, modifiers: Modifiers, time: Instant },
    PointerMove { pos: Pos2, time: Instant },
    PointerUp { pos: Pos2, modifiers: Modifiers, time: Instant },
    // positive delta zooms out, one unit per wheel notch
    Wheel { pos: Pos2, delta: f32 },
    Key { key: Key, modifiers: Modifiers },
    PointerLeave,
}
