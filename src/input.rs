//! Converts raw key and pointer input into engine intents.

use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Move(Direction),
    Interact,
    Strike,
}

impl KeyInput {
    /// Arrow names, WASD, `e` to interact and `f` to strike.
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "w" => Some(Self::Move(Direction::Up)),
            "s" => Some(Self::Move(Direction::Down)),
            "a" => Some(Self::Move(Direction::Left)),
            "d" => Some(Self::Move(Direction::Right)),
            "e" | "interact" | "enter" => Some(Self::Interact),
            "f" | "strike" | "space" => Some(Self::Strike),
            other => Direction::parse_move(other).map(Self::Move),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    /// Displacement request, clamped by the engine to the player speed.
    Move(Vec2),
    Interact,
    Strike,
    /// Pointer contact at an arena point.
    Touch(Vec2),
}

/// Keyboard steps are immediate; a held pointer is sampled periodically and
/// pulls the player toward it with damping.
#[derive(Clone, Debug)]
pub struct InputAdapter {
    step: f32,
    damping: f32,
    target: Option<Vec2>,
}

impl InputAdapter {
    pub fn new(step: f32, damping: f32) -> Self {
        Self {
            step,
            damping,
            target: None,
        }
    }

    pub fn on_key(&self, key: KeyInput) -> Intent {
        match key {
            KeyInput::Move(dir) => Intent::Move(dir.unit() * self.step),
            KeyInput::Interact => Intent::Interact,
            KeyInput::Strike => Intent::Strike,
        }
    }

    /// Pointer down starts a drag and reports the touched point. Events with
    /// non-finite coordinates are dropped.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Option<Intent> {
        match event {
            PointerEvent::Down(point) | PointerEvent::Move(point) if !point.is_finite() => None,
            PointerEvent::Down(point) => {
                self.target = Some(point);
                Some(Intent::Touch(point))
            }
            PointerEvent::Move(point) => {
                if self.target.is_some() {
                    self.target = Some(point);
                }
                None
            }
            PointerEvent::Up => {
                self.target = None;
                None
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.target.is_some()
    }

    /// Drops a drag in progress, e.g. when an encounter opens.
    pub fn cancel_drag(&mut self) {
        self.target = None;
    }

    /// Periodic drag sample: a damped step toward the pointer, or `None` when
    /// not dragging or already on target.
    pub fn sample(&self, player_pos: Vec2) -> Option<Intent> {
        let target = self.target?;
        let delta = target - player_pos;
        if delta.length() < 0.5 {
            return None;
        }
        Some(Intent::Move((delta * self.damping).clamp_length(self.step)))
    }
}
