use std::time::{SystemTime, UNIX_EPOCH};

use crate::rng::RandomSource;
use crate::types::{Direction, Vec2};

pub(crate) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn offset(pos: Vec2, dir: Direction, distance: f32) -> Vec2 {
    pos + dir.unit() * distance
}

pub(super) fn random_direction(rng: &mut dyn RandomSource) -> Direction {
    Direction::ALL[rng.pick_index(Direction::ALL.len())]
}

/// Index of the item closest to `origin` among those within `radius`.
pub(super) fn nearest_within<T>(
    items: &[T],
    origin: Vec2,
    radius: f32,
    pos_of: impl Fn(&T) -> Vec2,
    keep: impl Fn(&T) -> bool,
) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| keep(item))
        .map(|(idx, item)| (idx, origin.distance(pos_of(item))))
        .filter(|(_, dist)| *dist <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn offset_moves_along_direction() {
        let p = offset(Vec2::new(10.0, 10.0), Direction::Up, 4.0);
        assert_eq!(p, Vec2::new(10.0, 6.0));
        let p = offset(Vec2::new(10.0, 10.0), Direction::Right, 4.0);
        assert_eq!(p, Vec2::new(14.0, 10.0));
    }

    #[test]
    fn random_direction_covers_all_cardinals() {
        let mut rng = Rng::new(11);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let dir = random_direction(&mut rng);
            if !seen.contains(&dir) {
                seen.push(dir);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn nearest_within_respects_radius_and_filter() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(2.0, 0.0)];
        let origin = Vec2::new(4.0, 0.0);
        assert_eq!(nearest_within(&points, origin, 10.0, |p| *p, |_| true), Some(1));
        assert_eq!(
            nearest_within(&points, origin, 10.0, |p| *p, |p| p.x < 5.0),
            Some(2)
        );
        assert_eq!(nearest_within(&points, origin, 0.5, |p| *p, |_| true), None);
    }
}
