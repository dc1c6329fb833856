use crate::types::{ArenaInit, Obstacle, Theme, Vec2};

/// Walls of a theme as fractions of the arena size: `(x, y, width, height)`.
type Layout = &'static [(f32, f32, f32, f32)];

const COURTYARD: Layout = &[
    (0.15, 0.15, 0.25, 0.05),
    (0.60, 0.15, 0.25, 0.05),
    (0.15, 0.80, 0.25, 0.05),
    (0.60, 0.80, 0.25, 0.05),
    (0.45, 0.35, 0.10, 0.30),
    (0.20, 0.45, 0.05, 0.10),
    (0.75, 0.45, 0.05, 0.10),
];

const CORRIDORS: Layout = &[
    (0.10, 0.25, 0.55, 0.04),
    (0.35, 0.50, 0.55, 0.04),
    (0.10, 0.75, 0.55, 0.04),
    (0.85, 0.05, 0.04, 0.12),
];

const PILLARS: Layout = &[
    (0.17, 0.27, 0.06, 0.06),
    (0.37, 0.27, 0.06, 0.06),
    (0.57, 0.27, 0.06, 0.06),
    (0.77, 0.27, 0.06, 0.06),
    (0.17, 0.52, 0.06, 0.06),
    (0.37, 0.52, 0.06, 0.06),
    (0.57, 0.52, 0.06, 0.06),
    (0.77, 0.52, 0.06, 0.06),
    (0.17, 0.77, 0.06, 0.06),
    (0.37, 0.77, 0.06, 0.06),
    (0.57, 0.77, 0.06, 0.06),
    (0.77, 0.77, 0.06, 0.06),
];

const MEADOW: Layout = &[];

/// Player spawn of every theme, as a fraction of the arena size.
const SPAWN_FRACTION: (f32, f32) = (0.5, 0.08);

/// Static walkable region of a session: the border plus the obstacle set.
#[derive(Clone, Debug)]
pub struct Arena {
    pub theme: Theme,
    pub width: f32,
    pub height: f32,
    pub border_margin: f32,
    pub obstacles: Vec<Obstacle>,
    pub player_spawn: Vec2,
}

impl Arena {
    pub fn for_theme(theme: Theme, size: f32, border_margin: f32) -> Self {
        let layout = match theme {
            Theme::Courtyard => COURTYARD,
            Theme::Corridors => CORRIDORS,
            Theme::Pillars => PILLARS,
            Theme::Meadow => MEADOW,
        };
        let obstacles = layout
            .iter()
            .map(|&(x, y, w, h)| Obstacle::new(x * size, y * size, w * size, h * size))
            .collect();
        Self {
            theme,
            width: size,
            height: size,
            border_margin,
            obstacles,
            player_spawn: Vec2::new(SPAWN_FRACTION.0 * size, SPAWN_FRACTION.1 * size),
        }
    }

    pub fn new(
        theme: Theme,
        width: f32,
        height: f32,
        border_margin: f32,
        obstacles: Vec<Obstacle>,
        player_spawn: Vec2,
    ) -> Self {
        Self {
            theme,
            width,
            height,
            border_margin,
            obstacles,
            player_spawn,
        }
    }

    /// True when `point` expanded by `radius` leaves the inner bounds or
    /// overlaps an obstacle. Non-finite points are always blocked.
    pub fn is_blocked(&self, point: Vec2, radius: f32) -> bool {
        if !point.is_finite() {
            return true;
        }
        let (min, max) = self.inner_bounds(radius);
        if point.x < min.x || point.y < min.y || point.x > max.x || point.y > max.y {
            return true;
        }
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.overlaps(point, radius))
    }

    /// Range an actor centre of the given radius may occupy.
    pub fn inner_bounds(&self, radius: f32) -> (Vec2, Vec2) {
        let margin = self.border_margin + radius;
        (
            Vec2::new(margin, margin),
            Vec2::new(self.width - margin, self.height - margin),
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn to_init(&self, actor_radius: f32) -> ArenaInit {
        ArenaInit {
            theme: self.theme,
            width: self.width,
            height: self.height,
            border_margin: self.border_margin,
            actor_radius,
            obstacles: self.obstacles.clone(),
        }
    }
}
