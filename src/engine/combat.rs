use super::utils::random_direction;
use super::*;
use crate::constants::STRIKE_BASE_DAMAGE;
use crate::placement::place_point;

/// Damage scaling between the player and hostiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageModel {
    /// Fractional bonus on damage the player deals, e.g. `0.05` for +5%.
    pub dealt_bonus: f32,
}

impl DamageModel {
    pub fn dealt(&self, base: f32) -> f32 {
        base * (1.0 + self.dealt_bonus)
    }

    /// Hostile contact always costs exactly the base amount.
    pub fn received(&self, base: u32) -> u32 {
        base
    }
}

impl Session {
    /// Hits the nearest hostile within strike range. A defeated hostile awards
    /// points and respawns away from the player at full health.
    pub fn strike(&mut self, now_ms: u64) -> bool {
        if !self.phase.timers_running() || now_ms < self.player.strike_ready_at {
            return false;
        }
        self.observe_clock(now_ms);
        self.player.strike_ready_at = now_ms.saturating_add(self.config.strike_cooldown_ms);

        let Some(idx) = nearest_within(
            &self.hostiles,
            self.player.pos,
            self.config.strike_radius,
            |hostile| hostile.pos,
            |_| true,
        ) else {
            return false;
        };

        let damage = self.damage.dealt(STRIKE_BASE_DAMAGE);
        let hostile = &mut self.hostiles[idx];
        hostile.hp = (hostile.hp - damage).max(0.0);
        let hostile_id = hostile.id;
        let hp = hostile.hp;
        self.events.push(RuntimeEvent::HostileHit { hostile_id, hp });

        if hp <= 0.0 {
            self.score += self.config.hostile_defeat_points;
            self.events.push(RuntimeEvent::HostileDefeated { hostile_id });
            self.push_timeline(now_ms, &format!("hostile {hostile_id} defeated"));
            self.respawn_hostile(idx);
        }
        true
    }

    fn respawn_hostile(&mut self, idx: usize) {
        let mut anchors = vec![self.player.pos];
        anchors.extend(
            self.hostiles
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, hostile)| hostile.pos),
        );
        let pos = place_point(
            &self.arena,
            &anchors,
            self.config.hostile_spawn_placement(),
            self.rng.as_mut(),
        );
        let dir = random_direction(self.rng.as_mut());
        let hostile = &mut self.hostiles[idx];
        hostile.pos = pos;
        hostile.dir = dir;
        hostile.hp = self.config.hostile_max_hp;
        tracing::debug!(hostile_id = hostile.id, x = pos.x, y = pos.y, "hostile respawned");
    }
}
