//! Constrained random placement of chests, the portal and hostile spawns.
//!
//! Candidates are drawn uniformly inside the arena interior and accepted when
//! they are not blocked and keep `min_separation` from every anchor point. When
//! the attempt budget runs out the generator scans a fixed grid instead, so a
//! point is always returned and the same inputs always give the same fallback.

use crate::actors::Chest;
use crate::arena::Arena;
use crate::rng::RandomSource;
use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementConstraints {
    pub min_separation: f32,
    pub max_attempts: u32,
    /// Radius of the object being placed, used for collision checks.
    pub radius: f32,
}

pub fn place_point(
    arena: &Arena,
    existing: &[Vec2],
    constraints: PlacementConstraints,
    rng: &mut dyn RandomSource,
) -> Vec2 {
    place_point_avoiding(arena, existing, None, constraints, rng)
}

/// Places `count` points that are also mutually separated.
pub fn place_many(
    arena: &Arena,
    count: usize,
    existing: &[Vec2],
    constraints: PlacementConstraints,
    rng: &mut dyn RandomSource,
) -> Vec<Vec2> {
    let mut anchors = existing.to_vec();
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let point = place_point(arena, &anchors, constraints, rng);
        anchors.push(point);
        out.push(point);
    }
    out
}

/// Returns a new chest list where the chest `failed_id` has moved to a fresh
/// spot. Its own previous slot is not an anchor, but the new point must differ
/// from it. Other chests and `anchors` (portal, player) keep their separation.
/// Unknown or already opened ids return the list unchanged.
pub fn relocate_chest(
    chests: &[Chest],
    failed_id: u32,
    arena: &Arena,
    anchors: &[Vec2],
    constraints: PlacementConstraints,
    rng: &mut dyn RandomSource,
) -> Vec<Chest> {
    let Some(previous) = chests
        .iter()
        .find(|chest| chest.id == failed_id && !chest.open)
        .map(|chest| chest.pos)
    else {
        return chests.to_vec();
    };

    let mut existing: Vec<Vec2> = chests
        .iter()
        .filter(|chest| chest.id != failed_id)
        .map(|chest| chest.pos)
        .collect();
    existing.extend_from_slice(anchors);

    let next = place_point_avoiding(arena, &existing, Some(previous), constraints, rng);
    chests
        .iter()
        .map(|chest| {
            if chest.id == failed_id {
                Chest {
                    pos: next,
                    ..chest.clone()
                }
            } else {
                chest.clone()
            }
        })
        .collect()
}

pub fn is_acceptable(
    arena: &Arena,
    candidate: Vec2,
    existing: &[Vec2],
    constraints: PlacementConstraints,
) -> bool {
    !arena.is_blocked(candidate, constraints.radius)
        && existing
            .iter()
            .all(|other| candidate.distance(*other) >= constraints.min_separation)
}

fn place_point_avoiding(
    arena: &Arena,
    existing: &[Vec2],
    previous: Option<Vec2>,
    constraints: PlacementConstraints,
    rng: &mut dyn RandomSource,
) -> Vec2 {
    let (min, max) = arena.inner_bounds(constraints.radius);
    let accept = |candidate: Vec2| {
        is_acceptable(arena, candidate, existing, constraints)
            && previous
                .map(|prev| candidate.distance(prev) >= constraints.radius)
                .unwrap_or(true)
    };

    for _ in 0..constraints.max_attempts {
        let candidate = Vec2::new(rng.range_f32(min.x, max.x), rng.range_f32(min.y, max.y));
        if accept(candidate) {
            return candidate;
        }
    }

    let fallback = fallback_point(arena, existing, previous, constraints);
    tracing::warn!(
        attempts = constraints.max_attempts,
        x = fallback.x,
        y = fallback.y,
        "placement budget exhausted, using grid fallback"
    );
    fallback
}

/// Deterministic fallback: the first grid point (row-major from the top-left of
/// the interior, step = object diameter) that satisfies every constraint; then
/// the first unblocked grid point; then the arena centre.
pub fn fallback_point(
    arena: &Arena,
    existing: &[Vec2],
    previous: Option<Vec2>,
    constraints: PlacementConstraints,
) -> Vec2 {
    let grid = grid_points(arena, constraints.radius);
    let moved = |p: &Vec2| {
        previous
            .map(|prev| p.distance(prev) >= constraints.radius)
            .unwrap_or(true)
    };
    grid.iter()
        .copied()
        .find(|p| is_acceptable(arena, *p, existing, constraints) && moved(p))
        .or_else(|| {
            grid.iter()
                .copied()
                .find(|p| !arena.is_blocked(*p, constraints.radius) && moved(p))
        })
        .unwrap_or_else(|| arena.center())
}

fn grid_points(arena: &Arena, radius: f32) -> Vec<Vec2> {
    let (min, max) = arena.inner_bounds(radius);
    let step = (radius * 2.0).max(4.0);
    let mut out = Vec::new();
    let mut y = min.y;
    while y <= max.y {
        let mut x = min.x;
        while x <= max.x {
            out.push(Vec2::new(x, y));
            x += step;
        }
        y += step;
    }
    out
}
