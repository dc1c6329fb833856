use crate::types::{
    ChestView, Direction, HostileView, PlayerView, PortalView, Question, Vec2,
};

/// Externally driven actor.
#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub lives: u32,
    pub max_lives: u32,
    pub invulnerable_until: Option<u64>,
    pub last_damage_ms: Option<u64>,
    pub strike_ready_at: u64,
}

impl Player {
    pub fn new(pos: Vec2, max_lives: u32) -> Self {
        Self {
            pos,
            lives: max_lives,
            max_lives,
            invulnerable_until: None,
            last_damage_ms: None,
            strike_ready_at: 0,
        }
    }

    pub fn is_invulnerable(&self, now_ms: u64) -> bool {
        self.invulnerable_until
            .map(|until| now_ms < until)
            .unwrap_or(false)
    }

    /// Drops an expired invulnerability window.
    pub fn refresh_invulnerability(&mut self, now_ms: u64) {
        if !self.is_invulnerable(now_ms) {
            self.invulnerable_until = None;
        }
    }

    /// Removes `amount` lives (never below zero) and opens the invulnerability window.
    pub fn take_damage(&mut self, amount: u32, now_ms: u64, window_ms: u64) {
        self.lives = self.lives.saturating_sub(amount);
        self.last_damage_ms = Some(now_ms);
        self.invulnerable_until = Some(now_ms.saturating_add(window_ms));
    }

    pub fn view(&self, now_ms: u64) -> PlayerView {
        PlayerView {
            x: self.pos.x,
            y: self.pos.y,
            lives: self.lives,
            max_lives: self.max_lives,
            invulnerable: self.is_invulnerable(now_ms),
            invulnerable_until: self.invulnerable_until,
        }
    }
}

/// Autonomous patrolling actor.
#[derive(Clone, Debug)]
pub struct Hostile {
    pub id: u32,
    pub pos: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub hp: f32,
    pub last_tick_ms: u64,
}

impl Hostile {
    pub fn new(id: u32, pos: Vec2, dir: Direction, speed: f32, hp: f32) -> Self {
        Self {
            id,
            pos,
            dir,
            speed,
            hp,
            last_tick_ms: 0,
        }
    }

    pub fn view(&self) -> HostileView {
        HostileView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            speed: self.speed,
            hp: self.hp,
            last_tick_ms: self.last_tick_ms,
        }
    }
}

/// Reward container gating one question.
#[derive(Clone, Debug)]
pub struct Chest {
    pub id: u32,
    pub pos: Vec2,
    pub open: bool,
    pub category: String,
    /// `None` means the chest needs no answer to open.
    pub question: Option<Question>,
}

impl Chest {
    pub fn new(id: u32, pos: Vec2, category: impl Into<String>, question: Option<Question>) -> Self {
        Self {
            id,
            pos,
            open: false,
            category: category.into(),
            question,
        }
    }

    pub fn view(&self) -> ChestView {
        ChestView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            open: self.open,
            category: self.category.clone(),
            has_question: self.question.is_some(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Portal {
    pub pos: Vec2,
    pub keys_required: u32,
}

impl Portal {
    pub fn is_unlocked(&self, keys_collected: u32) -> bool {
        keys_collected >= self.keys_required
    }

    pub fn view(&self, keys_collected: u32) -> PortalView {
        PortalView {
            x: self.pos.x,
            y: self.pos.y,
            keys_required: self.keys_required,
            unlocked: self.is_unlocked(keys_collected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_lives_and_opens_window() {
        let mut player = Player::new(Vec2::new(10.0, 10.0), 1);
        player.take_damage(1, 1_000, 500);
        player.take_damage(1, 1_100, 500);
        assert_eq!(player.lives, 0);
        assert_eq!(player.last_damage_ms, Some(1_100));
        assert!(player.is_invulnerable(1_599));
        assert!(!player.is_invulnerable(1_600));
    }

    #[test]
    fn invulnerability_clears_after_window() {
        let mut player = Player::new(Vec2::ZERO, 3);
        player.take_damage(1, 0, 1_500);
        player.refresh_invulnerability(1_000);
        assert!(player.invulnerable_until.is_some());
        player.refresh_invulnerability(1_500);
        assert!(player.invulnerable_until.is_none());
        assert!(!player.view(1_500).invulnerable);
    }

    #[test]
    fn portal_unlocks_at_threshold() {
        let portal = Portal {
            pos: Vec2::ZERO,
            keys_required: 3,
        };
        assert!(!portal.is_unlocked(2));
        assert!(portal.is_unlocked(3));
        assert!(portal.view(4).unlocked);
    }
}
