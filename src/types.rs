use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit vector in arena coordinates (y grows downward).
    pub fn unit(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Shortens the vector to `max_len` when it is longer; otherwise returns it unchanged.
    /// A non-finite vector clamps to zero.
    pub fn clamp_length(self, max_len: f32) -> Vec2 {
        if !self.is_finite() {
            return Vec2::ZERO;
        }
        let len = self.length();
        if !len.is_finite() {
            // Squared components overflowed; rescale before measuring.
            let scaled = self * (1.0 / self.x.abs().max(self.y.abs()));
            return scaled * (max_len / scaled.length());
        }
        if len <= max_len || len == 0.0 {
            return self;
        }
        self * (max_len / len)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned wall rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when a square of half-extent `radius` centred on `point` overlaps the
    /// rectangle. Touching edges do not count.
    pub fn overlaps(&self, point: Vec2, radius: f32) -> bool {
        point.x > self.x - radius
            && point.x < self.x + self.width + radius
            && point.y > self.y - radius
            && point.y < self.y + self.height + radius
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Courtyard,
    Corridors,
    Pillars,
    Meadow,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "courtyard" => Some(Self::Courtyard),
            "corridors" => Some(Self::Corridors),
            "pillars" => Some(Self::Pillars),
            "meadow" => Some(Self::Meadow),
            _ => None,
        }
    }

    /// Zone tag passed to the question bank.
    pub fn zone(self) -> &'static str {
        match self {
            Self::Courtyard => "courtyard",
            Self::Corridors => "corridors",
            Self::Pillars => "pillars",
            Self::Meadow => "meadow",
        }
    }

    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Courtyard => &["history", "geography", "literature"],
            Self::Corridors => &["science", "mathematics"],
            Self::Pillars => &["art", "music", "history"],
            Self::Meadow => &["nature", "general"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Standard,
    Premium,
}

impl PlanTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "standard" => Some(Self::Standard),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeatCause {
    Timeout,
    Lives,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    Timeout,
    LivesDepleted,
}

impl From<DefeatCause> for GameOverReason {
    fn from(cause: DefeatCause) -> Self {
        match cause {
            DefeatCause::Timeout => Self::Timeout,
            DefeatCause::Lives => Self::LivesDepleted,
        }
    }
}

/// A knowledge-check record as supplied by the question bank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex", alias = "correct_index")]
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn is_well_formed(&self) -> bool {
        !self.prompt.trim().is_empty()
            && self.options.len() >= 2
            && self.correct_index < self.options.len()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaInit {
    pub theme: Theme,
    pub width: f32,
    pub height: f32,
    pub border_margin: f32,
    pub actor_radius: f32,
    pub obstacles: Vec<Obstacle>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub lives: u32,
    pub max_lives: u32,
    pub invulnerable: bool,
    pub invulnerable_until: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostileView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub speed: f32,
    pub hp: f32,
    pub last_tick_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChestView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub open: bool,
    pub category: String,
    pub has_question: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalView {
    pub x: f32,
    pub y: f32,
    pub keys_required: u32,
    pub unlocked: bool,
}

/// Question as shown to the player; the correct index is withheld.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub correct: bool,
    pub chosen: Option<usize>,
    pub explanation: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterView {
    pub chest_id: u32,
    pub question: QuestionView,
    pub deadline_ms: u64,
    pub feedback: Option<AnswerFeedback>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TimelineEvent {
    #[serde(rename = "atMs")]
    pub at_ms: u64,
    pub label: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    EncounterStarted {
        #[serde(rename = "chestId")]
        chest_id: u32,
    },
    AnswerResolved {
        #[serde(rename = "chestId")]
        chest_id: u32,
        correct: bool,
        explanation: String,
    },
    ChestOpened {
        #[serde(rename = "chestId")]
        chest_id: u32,
        #[serde(rename = "keysCollected")]
        keys_collected: u32,
    },
    ChestRelocated {
        #[serde(rename = "chestId")]
        chest_id: u32,
        from: Vec2,
        to: Vec2,
    },
    PlayerDamaged {
        #[serde(rename = "hostileId")]
        hostile_id: Option<u32>,
        lives: u32,
    },
    HostileHit {
        #[serde(rename = "hostileId")]
        hostile_id: u32,
        hp: f32,
    },
    HostileDefeated {
        #[serde(rename = "hostileId")]
        hostile_id: u32,
    },
    PortalUnlocked,
    SessionEnded {
        reason: GameOverReason,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub containers_opened: u32,
    pub containers_total: u32,
    pub final_score: u32,
}

/// Terminal result of a session, produced exactly once.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: String,
    pub theme: Theme,
    pub reason: GameOverReason,
    pub summary: ResultSummary,
    pub keys_collected: u32,
    pub lives_remaining: u32,
    pub elapsed_ms: u64,
    pub timeline: Vec<TimelineEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_overlap_excludes_touching_edges() {
        let wall = Obstacle::new(100.0, 100.0, 50.0, 20.0);
        assert!(wall.overlaps(Vec2::new(120.0, 110.0), 5.0));
        assert!(wall.overlaps(Vec2::new(96.0, 110.0), 5.0));
        assert!(!wall.overlaps(Vec2::new(95.0, 110.0), 5.0));
        assert!(!wall.overlaps(Vec2::new(120.0, 125.0), 5.0));
    }

    #[test]
    fn clamp_length_only_shortens() {
        let v = Vec2::new(30.0, 40.0);
        let clamped = v.clamp_length(10.0);
        assert!((clamped.length() - 10.0).abs() < 1e-4);
        assert_eq!(Vec2::new(1.0, 1.0).clamp_length(10.0), Vec2::new(1.0, 1.0));
        assert_eq!(Vec2::ZERO.clamp_length(0.0), Vec2::ZERO);
    }

    #[test]
    fn clamp_length_handles_extreme_vectors() {
        assert_eq!(Vec2::new(f32::NAN, 0.0).clamp_length(10.0), Vec2::ZERO);
        assert_eq!(Vec2::new(f32::INFINITY, 0.0).clamp_length(10.0), Vec2::ZERO);
        let huge = Vec2::new(3.0e38, -3.0e38).clamp_length(10.0);
        assert!(huge.is_finite());
        assert!((huge.length() - 10.0).abs() < 1e-3);
        assert!(huge.x > 0.0 && huge.y < 0.0);
    }

    #[test]
    fn direction_opposites_and_parsing() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!((dir.unit() + dir.opposite().unit()).length(), 0.0);
        }
        assert_eq!(Direction::parse_move("left"), Some(Direction::Left));
        assert_eq!(Direction::parse_move("none"), None);
    }

    #[test]
    fn question_deserializes_camel_case_and_checks_shape() {
        let question: Question = serde_json::from_str(
            r#"{"prompt":"2+2?","options":["3","4"],"correctIndex":1}"#,
        )
        .expect("question should parse");
        assert!(question.is_well_formed());
        assert_eq!(question.explanation, None);

        let broken = Question {
            correct_index: 5,
            ..question
        };
        assert!(!broken.is_well_formed());
    }
}
