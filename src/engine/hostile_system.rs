use super::utils::offset;
use crate::actors::Hostile;
use crate::arena::Arena;
use crate::rng::RandomSource;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileStep {
    pub pos: Vec2,
    pub dir: Direction,
    /// Direction differs from the one the hostile started the tick with.
    pub redirected: bool,
    /// Every fallback was blocked and the hostile stayed put.
    pub held: bool,
}

/// One patrol step. The current heading is tried first; when blocked a random
/// other heading is tried, then one of the two still untried. If those are
/// blocked too the hostile holds position facing the last heading it tried.
pub fn advance_hostile(
    arena: &Arena,
    hostile: &Hostile,
    radius: f32,
    rng: &mut dyn RandomSource,
) -> HostileStep {
    let free = |dir: Direction| {
        let next = offset(hostile.pos, dir, hostile.speed);
        (!arena.is_blocked(next, radius)).then_some(next)
    };

    if let Some(pos) = free(hostile.dir) {
        return HostileStep {
            pos,
            dir: hostile.dir,
            redirected: false,
            held: false,
        };
    }

    let mut untried: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| *dir != hostile.dir)
        .collect();
    let mut last_tried = hostile.dir;
    for _ in 0..2 {
        let dir = untried.remove(rng.pick_index(untried.len()));
        last_tried = dir;
        if let Some(pos) = free(dir) {
            return HostileStep {
                pos,
                dir,
                redirected: true,
                held: false,
            };
        }
    }

    HostileStep {
        pos: hostile.pos,
        dir: last_tried,
        redirected: last_tried != hostile.dir,
        held: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::types::{Obstacle, Theme};

    /// Replays fixed values in order, then repeats the last one.
    struct Scripted {
        values: Vec<f32>,
        cursor: usize,
    }

    impl Scripted {
        fn new(values: &[f32]) -> Self {
            Self {
                values: values.to_vec(),
                cursor: 0,
            }
        }
    }

    impl RandomSource for Scripted {
        fn next_f32(&mut self) -> f32 {
            let idx = self.cursor.min(self.values.len() - 1);
            self.cursor += 1;
            self.values[idx]
        }
    }

    fn open_arena() -> Arena {
        Arena::new(Theme::Meadow, 200.0, 200.0, 0.0, Vec::new(), Vec2::new(100.0, 20.0))
    }

    #[test]
    fn keeps_heading_when_free() {
        let arena = open_arena();
        let hostile = Hostile::new(1, Vec2::new(100.0, 100.0), Direction::Right, 6.0, 3.0);
        let step = advance_hostile(&arena, &hostile, 10.0, &mut Rng::new(1));
        assert_eq!(step.pos, Vec2::new(106.0, 100.0));
        assert_eq!(step.dir, Direction::Right);
        assert!(!step.redirected);
    }

    #[test]
    fn turns_when_heading_is_blocked() {
        let arena = open_arena();
        let hostile = Hostile::new(1, Vec2::new(188.0, 100.0), Direction::Right, 6.0, 3.0);
        for seed in 1..20 {
            let step = advance_hostile(&arena, &hostile, 10.0, &mut Rng::new(seed));
            assert_ne!(step.dir, Direction::Right);
            assert!(step.redirected);
            assert!(!step.held);
            assert!(!arena.is_blocked(step.pos, 10.0));
        }
    }

    #[test]
    fn second_fallback_picks_from_remaining_two() {
        // Right is blocked by the border and Up by a wall just above.
        let obstacles = vec![Obstacle::new(150.0, 60.0, 40.0, 28.0)];
        let arena = Arena::new(Theme::Pillars, 200.0, 200.0, 0.0, obstacles, Vec2::ZERO);
        let hostile = Hostile::new(1, Vec2::new(188.0, 100.0), Direction::Right, 6.0, 3.0);

        // Untried after Right: [Up, Down, Left]. 0.1 picks Up, which is
        // blocked, leaving [Down, Left] for the second pick.
        let mut rng = Scripted::new(&[0.1, 0.9]);
        let step = advance_hostile(&arena, &hostile, 10.0, &mut rng);
        assert_eq!(step.dir, Direction::Left);
        assert_eq!(step.pos, Vec2::new(182.0, 100.0));
        assert!(!step.held);

        let mut rng = Scripted::new(&[0.1, 0.0]);
        let step = advance_hostile(&arena, &hostile, 10.0, &mut rng);
        assert_eq!(step.dir, Direction::Down);
        assert_eq!(step.pos, Vec2::new(188.0, 106.0));
    }

    #[test]
    fn first_fallback_used_when_free() {
        let arena = open_arena();
        let hostile = Hostile::new(1, Vec2::new(188.0, 100.0), Direction::Right, 6.0, 3.0);
        // 0.5 of three untried [Up, Down, Left] picks Down.
        let mut rng = Scripted::new(&[0.5]);
        let step = advance_hostile(&arena, &hostile, 10.0, &mut rng);
        assert_eq!(step.dir, Direction::Down);
        assert_eq!(rng.cursor, 1);
    }

    #[test]
    fn holds_position_when_boxed_in() {
        // Corridor one step wide: walls on every side of the hostile.
        let obstacles = vec![
            Obstacle::new(0.0, 0.0, 200.0, 85.0),
            Obstacle::new(0.0, 115.0, 200.0, 85.0),
            Obstacle::new(0.0, 0.0, 85.0, 200.0),
            Obstacle::new(115.0, 0.0, 85.0, 200.0),
        ];
        let arena = Arena::new(Theme::Pillars, 200.0, 200.0, 0.0, obstacles, Vec2::ZERO);
        let hostile = Hostile::new(2, Vec2::new(100.0, 100.0), Direction::Up, 6.0, 3.0);
        let step = advance_hostile(&arena, &hostile, 10.0, &mut Rng::new(3));
        assert!(step.held);
        assert_eq!(step.pos, hostile.pos);
        assert_ne!(step.dir, Direction::Up);
    }

    #[test]
    fn never_enters_blocked_space() {
        let arena = Arena::for_theme(Theme::Corridors, 600.0, 4.0);
        let mut rng = Rng::new(99);
        let mut hostile = Hostile::new(1, Vec2::new(300.0, 300.0), Direction::Left, 6.0, 3.0);
        if arena.is_blocked(hostile.pos, 14.0) {
            hostile.pos = arena.player_spawn;
        }
        for _ in 0..2_000 {
            let step = advance_hostile(&arena, &hostile, 14.0, &mut rng);
            assert!(step.held || !arena.is_blocked(step.pos, 14.0));
            hostile.pos = step.pos;
            hostile.dir = step.dir;
        }
    }
}
