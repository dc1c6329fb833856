pub const COUNTDOWN_TICK_MS: u64 = 1_000;
pub const HOSTILE_TICK_MS: u64 = 100;
pub const INPUT_SAMPLE_MS: u64 = 50;

pub const ARENA_SIZE: f32 = 600.0;
pub const BORDER_MARGIN: f32 = 4.0;
pub const ACTOR_RADIUS: f32 = 14.0;

pub const PLAYER_SPEED: f32 = 10.0;
pub const POINTER_DAMPING: f32 = 0.25;
pub const MAX_LIVES: u32 = 3;
pub const INVULNERABILITY_MS: u64 = 1_500;
pub const TIME_LIMIT_SECS: u32 = 180;

pub const HOSTILE_COUNT: usize = 3;
pub const HOSTILE_SPEED: f32 = 6.0;
pub const HOSTILE_MAX_HP: f32 = 3.0;
pub const HOSTILE_SPAWN_CLEARANCE: f32 = 120.0;
pub const CONTACT_RADIUS: f32 = 24.0;

pub const CHEST_COUNT: usize = 4;
pub const KEYS_REQUIRED: u32 = 3;
pub const INTERACTION_RADIUS: f32 = 40.0;
pub const PORTAL_RADIUS: f32 = 30.0;
pub const MIN_SEPARATION: f32 = 80.0;
pub const PLACEMENT_MAX_ATTEMPTS: u32 = 200;

pub const SUCCESS_POINTS: u32 = 100;
pub const HOSTILE_DEFEAT_POINTS: u32 = 50;
pub const RESULT_DELAY_MS: u64 = 1_500;
pub const QUESTION_TIME_LIMIT_MS: u64 = 20_000;

/// Bonus applied to damage the player deals; damage the player receives is not scaled.
pub const PLAYER_DAMAGE_BONUS: f32 = 0.05;
pub const STRIKE_BASE_DAMAGE: f32 = 1.0;
pub const STRIKE_RADIUS: f32 = 36.0;
pub const STRIKE_COOLDOWN_MS: u64 = 400;

pub const TIMELINE_SNAPSHOT_LEN: usize = 24;
pub const DEFAULT_EXPLANATION: &str = "No explanation available.";
