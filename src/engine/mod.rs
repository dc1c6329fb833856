use crate::actors::{Chest, Hostile, Player, Portal};
use crate::arena::Arena;
use crate::collaborators::QuestionBank;
use crate::config::SessionConfig;
use crate::constants::{DEFAULT_EXPLANATION, TIMELINE_SNAPSHOT_LEN};
use crate::input::Intent;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    AnswerFeedback, ArenaInit, EncounterView, GameOverReason, Question, QuestionView,
    ResultSummary, RuntimeEvent, SessionOutcome, TimelineEvent, Vec2,
};

pub mod phase;

mod combat;
mod encounter_system;
mod hostile_system;
mod spawn_system;
mod utils;


pub use self::combat::DamageModel;
pub use self::hostile_system::{advance_hostile, HostileStep};
pub use self::phase::{defeat_cause, transition, Phase, PhaseEvent};
pub use self::spawn_system::{generate_layout, Layout};

use self::utils::{nearest_within, now_ms};

#[derive(Clone, Debug)]
struct AnswerResolution {
    feedback: AnswerFeedback,
    resume_at_ms: u64,
}

#[derive(Clone, Debug)]
struct ActiveEncounter {
    chest_id: u32,
    question: Question,
    deadline_ms: u64,
    resolution: Option<AnswerResolution>,
}

#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub now_ms: u64,
    pub phase: Phase,
    pub time_remaining_secs: u32,
    pub score: u32,
    pub keys_collected: u32,
    pub keys_required: u32,
    pub opened_count: u32,
    pub total_chests: u32,
    pub player: crate::types::PlayerView,
    pub hostiles: Vec<crate::types::HostileView>,
    pub chests: Vec<crate::types::ChestView>,
    pub portal: crate::types::PortalView,
    pub encounter: Option<EncounterView>,
    pub events: Vec<RuntimeEvent>,
    pub timeline: Vec<TimelineEvent>,
}

/// One play-through: arena, actors, counters and the phase machine.
///
/// All handlers take `now_ms`, the session clock in milliseconds since start,
/// supplied by whoever drives the timers. Handlers are no-ops outside the
/// phases they apply to, so a terminal session ignores every further call.
pub struct Session {
    pub config: SessionConfig,
    pub arena: Arena,

    session_id: String,
    rng: Box<dyn RandomSource>,
    damage: DamageModel,
    phase: Phase,
    player: Player,
    hostiles: Vec<Hostile>,
    chests: Vec<Chest>,
    portal: Portal,
    time_remaining: u32,
    score: u32,
    keys_collected: u32,
    portal_announced: bool,
    encounter: Option<ActiveEncounter>,
    events: Vec<RuntimeEvent>,
    timeline: Vec<TimelineEvent>,
    last_now_ms: u64,
    outcome: Option<SessionOutcome>,
    outcome_taken: bool,
}

impl Session {
    /// Builds a session for `config.theme`, drawing one question per chest and
    /// generating chest, portal and hostile positions from `seed`.
    pub fn new(config: SessionConfig, questions: &mut dyn QuestionBank, seed: u32) -> Self {
        Self::with_rng(config, questions, Box::new(Rng::new(seed)))
    }

    pub fn with_rng(
        config: SessionConfig,
        questions: &mut dyn QuestionBank,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let arena = Arena::for_theme(config.theme, config.arena_size, config.border_margin);
        let layout = generate_layout(&config, &arena, questions, rng.as_mut());
        Self::from_layout(config, arena, layout, rng)
    }

    /// Builds a session from an explicit layout.
    pub fn from_layout(
        config: SessionConfig,
        arena: Arena,
        layout: Layout,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let session_id = format!("session-{}", now_ms());
        let player = Player::new(layout.player_spawn, config.max_lives);
        let damage = DamageModel {
            dealt_bonus: config.player_damage_bonus,
        };
        tracing::info!(
            session_id = %session_id,
            theme = ?arena.theme,
            chests = layout.chests.len(),
            hostiles = layout.hostiles.len(),
            keys_required = layout.portal.keys_required,
            "session started"
        );
        Self {
            time_remaining: config.time_limit_secs,
            config,
            arena,
            session_id,
            rng,
            damage,
            phase: Phase::Exploring,
            player,
            hostiles: layout.hostiles,
            chests: layout.chests,
            portal: layout.portal,
            score: 0,
            keys_collected: 0,
            portal_announced: false,
            encounter: None,
            events: Vec::new(),
            timeline: vec![TimelineEvent {
                at_ms: 0,
                label: "session started".to_string(),
            }],
            last_now_ms: 0,
            outcome: None,
            outcome_taken: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn timers_running(&self) -> bool {
        self.phase.timers_running()
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn keys_collected(&self) -> u32 {
        self.keys_collected
    }

    pub fn opened_count(&self) -> u32 {
        self.chests.iter().filter(|chest| chest.open).count() as u32
    }

    pub fn total_chests(&self) -> u32 {
        self.chests.len() as u32
    }

    pub fn lives(&self) -> u32 {
        self.player.lives
    }

    pub fn player_position(&self) -> Vec2 {
        self.player.pos
    }

    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    pub fn chests(&self) -> &[Chest] {
        &self.chests
    }

    pub fn hostiles(&self) -> &[Hostile] {
        &self.hostiles
    }

    /// Question of the encounter in progress, including the correct answer.
    pub fn active_question(&self) -> Option<&Question> {
        self.encounter.as_ref().map(|encounter| &encounter.question)
    }

    /// Deadline of an unanswered encounter.
    pub fn encounter_deadline_ms(&self) -> Option<u64> {
        self.encounter
            .as_ref()
            .filter(|encounter| encounter.resolution.is_none())
            .map(|encounter| encounter.deadline_ms)
    }

    /// When an answered encounter hands control back to exploration.
    pub fn resume_at_ms(&self) -> Option<u64> {
        self.encounter
            .as_ref()
            .and_then(|encounter| encounter.resolution.as_ref())
            .map(|resolution| resolution.resume_at_ms)
    }

    /// 1 Hz countdown handler.
    pub fn tick_countdown(&mut self, now_ms: u64) {
        if !self.phase.timers_running() {
            return;
        }
        self.observe_clock(now_ms);
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.check_counters(now_ms);
    }

    /// Adversary tick handler: moves every hostile, then resolves contact.
    pub fn tick_hostiles(&mut self, now_ms: u64) {
        if !self.phase.timers_running() {
            return;
        }
        self.observe_clock(now_ms);
        self.player.refresh_invulnerability(now_ms);

        let steps: Vec<HostileStep> = self
            .hostiles
            .iter()
            .map(|hostile| {
                advance_hostile(&self.arena, hostile, self.config.actor_radius, self.rng.as_mut())
            })
            .collect();

        let mut player = self.player.clone();
        let mut hostiles = self.hostiles.clone();
        let mut damage_events = Vec::new();
        for (hostile, step) in hostiles.iter_mut().zip(steps) {
            if step.redirected {
                tracing::debug!(hostile_id = hostile.id, dir = ?step.dir, held = step.held, "hostile redirected");
            }
            hostile.pos = step.pos;
            hostile.dir = step.dir;
            hostile.last_tick_ms = now_ms;

            let in_contact = hostile.pos.distance(player.pos) < self.config.contact_radius;
            if in_contact && !player.is_invulnerable(now_ms) {
                player.take_damage(
                    self.damage.received(1),
                    now_ms,
                    self.config.invulnerability_ms,
                );
                hostile.dir = hostile.dir.opposite();
                damage_events.push(RuntimeEvent::PlayerDamaged {
                    hostile_id: Some(hostile.id),
                    lives: player.lives,
                });
            }
        }

        self.player = player;
        self.hostiles = hostiles;
        for event in damage_events {
            self.push_timeline(now_ms, "player hit by hostile");
            self.events.push(event);
        }
        self.check_counters(now_ms);
    }

    /// Moves the player by `delta` (clamped to the player speed) when the
    /// destination is free. Returns whether the player moved.
    pub fn move_player(&mut self, delta: Vec2, now_ms: u64) -> bool {
        if !self.phase.timers_running() || !delta.is_finite() {
            return false;
        }
        self.observe_clock(now_ms);
        let step = delta.clamp_length(self.config.player_speed);
        let destination = self.player.pos + step;
        if self.arena.is_blocked(destination, self.config.actor_radius) {
            return false;
        }
        self.player.pos = destination;
        self.check_portal(now_ms);
        true
    }

    /// Routes an input intent to the matching handler.
    pub fn apply_intent(&mut self, intent: Intent, now_ms: u64) -> bool {
        match intent {
            Intent::Move(delta) => self.move_player(delta, now_ms),
            Intent::Interact => self.interact(now_ms),
            Intent::Strike => self.strike(now_ms),
            Intent::Touch(point) => self.touch(point, now_ms),
        }
    }

    /// Interacts with the nearest unopened chest in range.
    pub fn interact(&mut self, now_ms: u64) -> bool {
        let Some(idx) = nearest_within(
            &self.chests,
            self.player.pos,
            self.config.interaction_radius,
            |chest| chest.pos,
            |chest| !chest.open,
        ) else {
            return false;
        };
        let chest_id = self.chests[idx].id;
        self.open_chest(chest_id, now_ms)
    }

    /// Pointer contact: opens the unopened chest under `point` if it is in range.
    pub fn touch(&mut self, point: Vec2, now_ms: u64) -> bool {
        let player_pos = self.player.pos;
        let reach = self.config.interaction_radius;
        let Some(idx) = nearest_within(
            &self.chests,
            point,
            self.config.actor_radius,
            |chest| chest.pos,
            |chest| !chest.open && chest.pos.distance(player_pos) <= reach,
        ) else {
            return false;
        };
        let chest_id = self.chests[idx].id;
        self.open_chest(chest_id, now_ms)
    }

    pub fn arena_init(&self) -> ArenaInit {
        self.arena.to_init(self.config.actor_radius)
    }

    pub fn build_summary(&self) -> ResultSummary {
        ResultSummary {
            containers_opened: self.opened_count(),
            containers_total: self.total_chests(),
            final_score: self.score,
        }
    }

    /// Terminal outcome; yields `Some` exactly once per session.
    pub fn take_outcome(&mut self) -> Option<SessionOutcome> {
        if self.outcome_taken {
            return None;
        }
        let outcome = self.outcome.take()?;
        self.outcome_taken = true;
        Some(outcome)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.last_now_ms;
        let encounter = self.encounter.as_ref().map(|encounter| EncounterView {
            chest_id: encounter.chest_id,
            question: QuestionView {
                prompt: encounter.question.prompt.clone(),
                options: encounter.question.options.clone(),
            },
            deadline_ms: encounter.deadline_ms,
            feedback: encounter
                .resolution
                .as_ref()
                .map(|resolution| resolution.feedback.clone()),
        });
        let timeline_start = self.timeline.len().saturating_sub(TIMELINE_SNAPSHOT_LEN);
        Snapshot {
            now_ms,
            phase: self.phase,
            time_remaining_secs: self.time_remaining,
            score: self.score,
            keys_collected: self.keys_collected,
            keys_required: self.portal.keys_required,
            opened_count: self.opened_count(),
            total_chests: self.total_chests(),
            player: self.player.view(now_ms),
            hostiles: self.hostiles.iter().map(Hostile::view).collect(),
            chests: self.chests.iter().map(Chest::view).collect(),
            portal: self.portal.view(self.keys_collected),
            encounter,
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
            timeline: self.timeline[timeline_start..].to_vec(),
        }
    }

    fn observe_clock(&mut self, now_ms: u64) {
        self.last_now_ms = self.last_now_ms.max(now_ms);
    }

    fn check_counters(&mut self, now_ms: u64) {
        let next = transition(
            self.phase,
            PhaseEvent::Counters {
                time_remaining: self.time_remaining,
                lives: self.player.lives,
            },
        );
        if let Phase::Defeat { cause } = next {
            self.phase = next;
            self.finish(now_ms, GameOverReason::from(cause));
        }
    }

    fn check_portal(&mut self, now_ms: u64) {
        if self.player.pos.distance(self.portal.pos) > self.config.portal_radius {
            return;
        }
        let next = transition(
            self.phase,
            PhaseEvent::PortalReached {
                keys_collected: self.keys_collected,
                keys_required: self.portal.keys_required,
            },
        );
        if next == Phase::Victory {
            self.phase = next;
            self.finish(now_ms, GameOverReason::Victory);
        }
    }

    fn finish(&mut self, now_ms: u64, reason: GameOverReason) {
        if self.outcome.is_some() || self.outcome_taken {
            return;
        }
        self.observe_clock(now_ms);
        self.encounter = None;
        self.push_timeline(now_ms, &format!("session ended: {reason:?}"));
        self.events.push(RuntimeEvent::SessionEnded { reason });
        let summary = self.build_summary();
        tracing::info!(
            session_id = %self.session_id,
            reason = ?reason,
            opened = summary.containers_opened,
            total = summary.containers_total,
            score = summary.final_score,
            elapsed_ms = now_ms,
            "session ended"
        );
        self.outcome = Some(SessionOutcome {
            session_id: self.session_id.clone(),
            theme: self.arena.theme,
            reason,
            summary,
            keys_collected: self.keys_collected,
            lives_remaining: self.player.lives,
            elapsed_ms: now_ms,
            timeline: self.timeline.clone(),
        });
    }

    fn push_timeline(&mut self, at_ms: u64, label: &str) {
        self.timeline.push(TimelineEvent {
            at_ms,
            label: label.to_string(),
        });
    }

    fn explanation_for(question: &Question) -> String {
        question
            .explanation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string()
    }
}
