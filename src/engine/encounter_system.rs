use super::*;
use crate::placement::relocate_chest;

impl Session {
    /// Starts an encounter with chest `chest_id`. Only acts while exploring
    /// and on an unopened chest; repeated calls are no-ops.
    pub fn open_chest(&mut self, chest_id: u32, now_ms: u64) -> bool {
        if self.phase != Phase::Exploring {
            return false;
        }
        let Some(idx) = self
            .chests
            .iter()
            .position(|chest| chest.id == chest_id && !chest.open)
        else {
            return false;
        };
        self.observe_clock(now_ms);

        let Some(question) = self.chests[idx].question.clone() else {
            self.award_chest(idx, now_ms);
            self.check_portal(now_ms);
            return true;
        };

        self.phase = transition(self.phase, PhaseEvent::OpenChest { chest_id });
        self.encounter = Some(ActiveEncounter {
            chest_id,
            question,
            deadline_ms: now_ms.saturating_add(self.config.question_time_limit_ms),
            resolution: None,
        });
        self.events.push(RuntimeEvent::EncounterStarted { chest_id });
        self.push_timeline(now_ms, &format!("chest {chest_id} encounter"));
        tracing::debug!(chest_id, "encounter started");
        true
    }

    /// Resolves the open encounter. `None` counts as a wrong answer, as does
    /// an index outside the options.
    pub fn submit_answer(&mut self, chosen: Option<usize>, now_ms: u64) -> bool {
        let Some(encounter) = self.encounter.as_ref() else {
            return false;
        };
        if encounter.resolution.is_some() {
            return false;
        }
        let chest_id = encounter.chest_id;
        let correct = chosen == Some(encounter.question.correct_index);
        let explanation = Self::explanation_for(&encounter.question);
        self.observe_clock(now_ms);

        match self.chests.iter().position(|chest| chest.id == chest_id) {
            Some(idx) if correct => self.award_chest(idx, now_ms),
            Some(_) => self.penalize_chest(chest_id, now_ms),
            None => {}
        }
        self.events.push(RuntimeEvent::AnswerResolved {
            chest_id,
            correct,
            explanation: explanation.clone(),
        });

        let resume_at_ms = now_ms.saturating_add(self.config.result_delay_ms);
        if let Some(encounter) = self.encounter.as_mut() {
            encounter.resolution = Some(AnswerResolution {
                feedback: AnswerFeedback {
                    correct,
                    chosen,
                    explanation,
                },
                resume_at_ms,
            });
        }
        if self.config.result_delay_ms == 0 {
            self.resume(now_ms);
        }
        true
    }

    /// Deadline handler: an unanswered encounter past its deadline resolves
    /// as a wrong answer.
    pub fn expire_encounter(&mut self, now_ms: u64) -> bool {
        match self.encounter_deadline_ms() {
            Some(deadline) if now_ms >= deadline => {
                tracing::debug!(deadline, now_ms, "encounter timed out");
                self.submit_answer(None, now_ms)
            }
            _ => false,
        }
    }

    /// Leaves the result screen and returns to exploring, then applies any
    /// defeat or victory the encounter produced.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.resume_at_ms().is_none() {
            return false;
        }
        self.observe_clock(now_ms);
        self.encounter = None;
        self.phase = transition(self.phase, PhaseEvent::EncounterResolved);
        self.check_counters(now_ms);
        self.check_portal(now_ms);
        true
    }

    fn award_chest(&mut self, idx: usize, now_ms: u64) {
        let chest_id = self.chests[idx].id;
        self.chests[idx].open = true;
        self.keys_collected += 1;
        self.score += self.config.success_points;
        self.events.push(RuntimeEvent::ChestOpened {
            chest_id,
            keys_collected: self.keys_collected,
        });
        self.push_timeline(now_ms, &format!("chest {chest_id} opened"));
        if !self.portal_announced && self.portal.is_unlocked(self.keys_collected) {
            self.portal_announced = true;
            self.events.push(RuntimeEvent::PortalUnlocked);
            self.push_timeline(now_ms, "portal unlocked");
            tracing::info!(keys = self.keys_collected, "portal unlocked");
        }
    }

    fn penalize_chest(&mut self, chest_id: u32, now_ms: u64) {
        self.player.lives = self.player.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::PlayerDamaged {
            hostile_id: None,
            lives: self.player.lives,
        });

        let anchors = [self.portal.pos, self.player.pos];
        let from = self.chests.iter().find(|chest| chest.id == chest_id).map(|chest| chest.pos);
        self.chests = relocate_chest(
            &self.chests,
            chest_id,
            &self.arena,
            &anchors,
            self.config.placement(),
            self.rng.as_mut(),
        );
        let to = self.chests.iter().find(|chest| chest.id == chest_id).map(|chest| chest.pos);
        if let (Some(from), Some(to)) = (from, to) {
            self.events.push(RuntimeEvent::ChestRelocated { chest_id, from, to });
        }
        self.push_timeline(now_ms, &format!("chest {chest_id} answer missed"));
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{open_session, place_player, test_config};
    use super::*;
    use crate::types::DefeatCause;

    fn at_chest(session: &mut Session, chest_id: u32) {
        let pos = session
            .chests()
            .iter()
            .find(|chest| chest.id == chest_id)
            .map(|chest| chest.pos)
            .unwrap();
        place_player(session, pos + Vec2::new(0.0, -20.0));
    }

    #[test]
    fn correct_answer_opens_chest_and_scores() {
        let mut session = open_session(test_config(), Vec::new());
        at_chest(&mut session, 1);
        assert!(session.interact(100));
        assert_eq!(session.phase(), Phase::Encounter { chest_id: 1 });
        assert!(!session.timers_running());
        assert!(session.submit_answer(Some(1), 200));
        assert_eq!(session.phase(), Phase::Exploring);
        assert_eq!(session.keys_collected(), 1);
        assert_eq!(session.score(), session.config.success_points);
        assert!(session.chests()[0].open);
        assert_eq!(session.lives(), session.config.max_lives);
    }

    #[test]
    fn submitted_answer_reports_feedback_at_submit_time() {
        let config = SessionConfig {
            result_delay_ms: 1_000,
            ..test_config()
        };
        let mut session = open_session(config, Vec::new());
        assert!(session.open_chest(1, 100));
        assert!(session.submit_answer(Some(1), 5_000));
        let snapshot = session.build_snapshot(true);
        assert_eq!(snapshot.now_ms, 5_000);
        let feedback = snapshot
            .encounter
            .and_then(|encounter| encounter.feedback)
            .expect("feedback while the result is shown");
        assert!(feedback.correct);
        assert_eq!(feedback.chosen, Some(1));
        assert!(snapshot.events.iter().any(|event| matches!(
            event,
            RuntimeEvent::AnswerResolved {
                chest_id: 1,
                correct: true,
                ..
            }
        )));
        assert_eq!(session.resume_at_ms(), Some(6_000));
    }

    #[test]
    fn wrong_answer_costs_life_and_moves_chest() {
        let mut session = open_session(test_config(), Vec::new());
        at_chest(&mut session, 2);
        let before = session.chests()[1].pos;
        session.interact(100);
        session.submit_answer(Some(0), 200);
        let after = &session.chests()[1];
        assert!(!after.open);
        assert_ne!(after.pos, before);
        assert!(!session.arena.is_blocked(after.pos, session.config.actor_radius));
        assert_eq!(session.lives(), session.config.max_lives - 1);
        assert_eq!(session.keys_collected(), 0);
        assert_eq!(session.score(), 0);
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::ChestRelocated { chest_id: 2, .. })));
    }

    #[test]
    fn open_is_idempotent_and_phase_gated() {
        let mut session = open_session(test_config(), Vec::new());
        at_chest(&mut session, 1);
        assert!(session.open_chest(1, 100));
        assert!(!session.open_chest(1, 110));
        assert!(!session.open_chest(2, 120));
        session.submit_answer(Some(1), 200);
        assert!(!session.open_chest(1, 300));
        assert_eq!(session.keys_collected(), 1);
        assert!(!session.submit_answer(Some(1), 310));
        assert_eq!(session.keys_collected(), 1);
    }

    #[test]
    fn deadline_resolves_as_wrong() {
        let config = SessionConfig {
            question_time_limit_ms: 5_000,
            ..test_config()
        };
        let mut session = open_session(config, Vec::new());
        at_chest(&mut session, 1);
        session.interact(1_000);
        assert_eq!(session.encounter_deadline_ms(), Some(6_000));
        assert!(!session.expire_encounter(5_999));
        assert!(session.expire_encounter(6_000));
        assert_eq!(session.lives(), session.config.max_lives - 1);
        assert_eq!(session.phase(), Phase::Exploring);
    }

    #[test]
    fn result_delay_holds_encounter_until_resume() {
        let config = SessionConfig {
            result_delay_ms: 1_500,
            ..test_config()
        };
        let mut session = open_session(config, Vec::new());
        at_chest(&mut session, 1);
        session.interact(0);
        session.submit_answer(Some(1), 500);
        assert_eq!(session.phase(), Phase::Encounter { chest_id: 1 });
        assert_eq!(session.resume_at_ms(), Some(2_000));
        assert_eq!(session.encounter_deadline_ms(), None);
        let snapshot = session.build_snapshot(false);
        let feedback = snapshot.encounter.and_then(|e| e.feedback).unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.explanation, "because");
        assert!(session.resume(2_000));
        assert_eq!(session.phase(), Phase::Exploring);
        assert!(!session.resume(2_100));
    }

    #[test]
    fn last_life_lost_to_wrong_answer_ends_on_resume() {
        let config = SessionConfig {
            max_lives: 1,
            ..test_config()
        };
        let mut session = open_session(config, Vec::new());
        at_chest(&mut session, 1);
        session.interact(0);
        session.submit_answer(None, 100);
        assert_eq!(
            session.phase(),
            Phase::Defeat {
                cause: DefeatCause::Lives
            }
        );
        assert!(session.take_outcome().is_some());
    }

    #[test]
    fn portal_unlock_is_announced_once() {
        let config = SessionConfig {
            keys_required: 2,
            ..test_config()
        };
        let mut session = open_session(config, Vec::new());
        for chest_id in 1..=3 {
            at_chest(&mut session, chest_id);
            session.interact(chest_id as u64 * 100);
            session.submit_answer(Some(1), chest_id as u64 * 100 + 50);
        }
        let snapshot = session.build_snapshot(true);
        let announced = snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::PortalUnlocked))
            .count();
        assert_eq!(announced, 1);
        assert!(snapshot.portal.unlocked);
    }

    #[test]
    fn unquizzed_chest_opens_immediately() {
        let mut session = open_session(test_config(), Vec::new());
        session.chests[0].question = None;
        at_chest(&mut session, 1);
        assert!(session.interact(10));
        assert_eq!(session.phase(), Phase::Exploring);
        assert!(session.chests()[0].open);
        assert_eq!(session.keys_collected(), 1);
    }

    #[test]
    fn touch_requires_range() {
        let mut session = open_session(test_config(), Vec::new());
        let target = session.chests()[0].pos;
        assert!(!session.touch(target, 10));
        at_chest(&mut session, 1);
        assert!(!session.touch(target + Vec2::new(50.0, 0.0), 20));
        assert!(session.touch(target + Vec2::new(3.0, 0.0), 30));
        assert_eq!(session.phase(), Phase::Encounter { chest_id: 1 });
    }
}
