use std::env;

use serde::Serialize;

use crate::constants::{
    ACTOR_RADIUS, ARENA_SIZE, BORDER_MARGIN, CHEST_COUNT, CONTACT_RADIUS, HOSTILE_COUNT,
    HOSTILE_DEFEAT_POINTS, HOSTILE_MAX_HP, HOSTILE_SPAWN_CLEARANCE, HOSTILE_SPEED,
    INTERACTION_RADIUS, INVULNERABILITY_MS, KEYS_REQUIRED, MAX_LIVES, MIN_SEPARATION,
    PLACEMENT_MAX_ATTEMPTS, PLAYER_DAMAGE_BONUS, PLAYER_SPEED, POINTER_DAMPING, PORTAL_RADIUS,
    QUESTION_TIME_LIMIT_MS, RESULT_DELAY_MS, STRIKE_COOLDOWN_MS, STRIKE_RADIUS, SUCCESS_POINTS,
    TIME_LIMIT_SECS,
};
use crate::error::ConfigError;
use crate::placement::PlacementConstraints;
use crate::types::Theme;

/// Tuning for one session. Defaults come from `constants`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub theme: Theme,
    pub arena_size: f32,
    pub border_margin: f32,
    pub actor_radius: f32,
    pub player_speed: f32,
    pub pointer_damping: f32,
    pub max_lives: u32,
    pub invulnerability_ms: u64,
    pub time_limit_secs: u32,
    pub hostile_count: usize,
    pub hostile_speed: f32,
    pub hostile_max_hp: f32,
    pub hostile_spawn_clearance: f32,
    pub contact_radius: f32,
    pub chest_count: usize,
    pub keys_required: u32,
    pub interaction_radius: f32,
    pub portal_radius: f32,
    pub min_separation: f32,
    pub placement_max_attempts: u32,
    pub success_points: u32,
    pub hostile_defeat_points: u32,
    pub result_delay_ms: u64,
    pub question_time_limit_ms: u64,
    pub player_damage_bonus: f32,
    pub strike_radius: f32,
    pub strike_cooldown_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Courtyard,
            arena_size: ARENA_SIZE,
            border_margin: BORDER_MARGIN,
            actor_radius: ACTOR_RADIUS,
            player_speed: PLAYER_SPEED,
            pointer_damping: POINTER_DAMPING,
            max_lives: MAX_LIVES,
            invulnerability_ms: INVULNERABILITY_MS,
            time_limit_secs: TIME_LIMIT_SECS,
            hostile_count: HOSTILE_COUNT,
            hostile_speed: HOSTILE_SPEED,
            hostile_max_hp: HOSTILE_MAX_HP,
            hostile_spawn_clearance: HOSTILE_SPAWN_CLEARANCE,
            contact_radius: CONTACT_RADIUS,
            chest_count: CHEST_COUNT,
            keys_required: KEYS_REQUIRED,
            interaction_radius: INTERACTION_RADIUS,
            portal_radius: PORTAL_RADIUS,
            min_separation: MIN_SEPARATION,
            placement_max_attempts: PLACEMENT_MAX_ATTEMPTS,
            success_points: SUCCESS_POINTS,
            hostile_defeat_points: HOSTILE_DEFEAT_POINTS,
            result_delay_ms: RESULT_DELAY_MS,
            question_time_limit_ms: QUESTION_TIME_LIMIT_MS,
            player_damage_bonus: PLAYER_DAMAGE_BONUS,
            strike_radius: STRIKE_RADIUS,
            strike_cooldown_ms: STRIKE_COOLDOWN_MS,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `MAZE_*` environment variables. Unparseable or
    /// non-positive values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let theme = env::var("MAZE_THEME")
            .ok()
            .and_then(|value| Theme::parse(value.trim()))
            .unwrap_or(defaults.theme);
        Self {
            theme,
            time_limit_secs: read_env_u32("MAZE_TIME_LIMIT_SECS", defaults.time_limit_secs),
            max_lives: read_env_u32("MAZE_MAX_LIVES", defaults.max_lives),
            chest_count: read_env_usize("MAZE_CHEST_COUNT", defaults.chest_count),
            keys_required: read_env_u32("MAZE_KEYS_REQUIRED", defaults.keys_required),
            hostile_count: read_env_usize("MAZE_HOSTILE_COUNT", defaults.hostile_count),
            hostile_speed: read_env_f32("MAZE_HOSTILE_SPEED", defaults.hostile_speed),
            player_speed: read_env_f32("MAZE_PLAYER_SPEED", defaults.player_speed),
            result_delay_ms: read_env_u64("MAZE_RESULT_DELAY_MS", defaults.result_delay_ms),
            question_time_limit_ms: read_env_u64(
                "MAZE_QUESTION_TIME_LIMIT_MS",
                defaults.question_time_limit_ms,
            ),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, f64); 11] = [
            ("arena_size", self.arena_size as f64),
            ("actor_radius", self.actor_radius as f64),
            ("player_speed", self.player_speed as f64),
            ("max_lives", self.max_lives as f64),
            ("time_limit_secs", self.time_limit_secs as f64),
            ("hostile_speed", self.hostile_speed as f64),
            ("hostile_max_hp", self.hostile_max_hp as f64),
            ("contact_radius", self.contact_radius as f64),
            ("interaction_radius", self.interaction_radius as f64),
            ("portal_radius", self.portal_radius as f64),
            ("min_separation", self.min_separation as f64),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.keys_required as usize > self.chest_count {
            return Err(ConfigError::KeysExceedChests {
                keys_required: self.keys_required,
                chest_count: self.chest_count,
            });
        }
        if !(self.pointer_damping > 0.0 && self.pointer_damping <= 1.0) {
            return Err(ConfigError::PointerDamping(self.pointer_damping));
        }
        if self.min_separation >= self.arena_size {
            return Err(ConfigError::SeparationTooLarge {
                min_separation: self.min_separation,
                arena_size: self.arena_size,
            });
        }
        if self.player_damage_bonus < 0.0 {
            return Err(ConfigError::NegativeDamageBonus(self.player_damage_bonus));
        }
        Ok(())
    }

    pub fn placement(&self) -> PlacementConstraints {
        PlacementConstraints {
            min_separation: self.min_separation,
            max_attempts: self.placement_max_attempts,
            radius: self.actor_radius,
        }
    }

    pub fn hostile_spawn_placement(&self) -> PlacementConstraints {
        PlacementConstraints {
            min_separation: self.hostile_spawn_clearance,
            ..self.placement()
        }
    }
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

pub(crate) fn read_env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn keys_cannot_exceed_chests() {
        let config = SessionConfig {
            chest_count: 2,
            keys_required: 3,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::KeysExceedChests {
                keys_required: 3,
                chest_count: 2
            })
        );
    }

    #[test]
    fn zero_lives_and_time_are_rejected() {
        let config = SessionConfig {
            max_lives: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "max_lives",
                ..
            })
        ));
        let config = SessionConfig {
            time_limit_secs: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn damping_and_separation_bounds() {
        let config = SessionConfig {
            pointer_damping: 1.5,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PointerDamping(1.5)));
        let config = SessionConfig {
            min_separation: 900.0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SeparationTooLarge { .. })
        ));
    }

    #[test]
    fn env_helpers_fall_back_on_garbage() {
        assert_eq!(read_env_u32("MAZE_TEST_UNSET_VARIABLE", 7), 7);
        assert_eq!(read_env_f32("MAZE_TEST_UNSET_VARIABLE", 2.5), 2.5);
    }

    #[test]
    fn hostile_spawn_placement_uses_clearance() {
        let config = SessionConfig::default();
        let placement = config.hostile_spawn_placement();
        assert_eq!(placement.min_separation, config.hostile_spawn_clearance);
        assert_eq!(placement.radius, config.actor_radius);
    }
}
