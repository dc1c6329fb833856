//! Drives a [`Session`] in real time: the 1 Hz countdown, the hostile tick,
//! pointer sampling, encounter deadlines and player commands.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use crate::constants::{COUNTDOWN_TICK_MS, HOSTILE_TICK_MS, INPUT_SAMPLE_MS};
use crate::engine::{Session, Snapshot};
use crate::input::{InputAdapter, KeyInput, PointerEvent};
use crate::types::SessionOutcome;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Key(KeyInput),
    Pointer(PointerEvent),
    /// Answer to the open encounter; `None` gives up.
    Answer(Option<usize>),
    Quit,
}

/// Runs `session` until it reaches a terminal phase and returns its outcome.
/// Returns `None` when the player quits or the command channel closes first.
///
/// The countdown and hostile timers only fire while exploring, so time spent
/// on a question never counts against the clock. The part of the current
/// countdown second already played before an encounter carries over to the
/// first tick after it.
pub async fn run_session<F>(
    session: &mut Session,
    commands: &mut mpsc::Receiver<Command>,
    mut observe: F,
) -> Option<SessionOutcome>
where
    F: FnMut(&Snapshot),
{
    let start = Instant::now();
    let now_ms = || start.elapsed().as_millis() as u64;

    let countdown_period = Duration::from_millis(COUNTDOWN_TICK_MS);
    let mut countdown = interval_at(start + countdown_period, countdown_period);
    let mut hostile_tick = interval_at(
        start + Duration::from_millis(HOSTILE_TICK_MS),
        Duration::from_millis(HOSTILE_TICK_MS),
    );
    let mut sampler = interval_at(
        start + Duration::from_millis(INPUT_SAMPLE_MS),
        Duration::from_millis(INPUT_SAMPLE_MS),
    );
    for timer in [&mut countdown, &mut hostile_tick, &mut sampler] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    let mut input = InputAdapter::new(session.config.player_speed, session.config.pointer_damping);
    let mut was_running = session.timers_running();
    let mut last_countdown_at = start;
    let mut carried = Duration::ZERO;
    observe(&session.build_snapshot(true));

    while !session.is_ended() {
        let running = session.timers_running();
        if running && !was_running {
            let now = Instant::now();
            countdown = interval_at(now + (countdown_period - carried), countdown_period);
            countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
            last_countdown_at = now - carried;
            hostile_tick.reset();
            sampler.reset();
            tracing::debug!(now_ms = now_ms(), "timers resumed");
        } else if !running && was_running {
            carried = Instant::now()
                .saturating_duration_since(last_countdown_at)
                .min(countdown_period);
            input.cancel_drag();
            tracing::debug!(now_ms = now_ms(), carried_ms = carried.as_millis() as u64, "timers suspended");
        }
        was_running = running;

        let dragging = input.is_dragging();
        let deadline = session
            .encounter_deadline_ms()
            .map(|ms| start + Duration::from_millis(ms));
        let resume_at = session
            .resume_at_ms()
            .map(|ms| start + Duration::from_millis(ms));

        tokio::select! {
            at = countdown.tick(), if running => {
                last_countdown_at = at;
                session.tick_countdown(now_ms());
            }
            _ = hostile_tick.tick(), if running => session.tick_hostiles(now_ms()),
            _ = sampler.tick(), if running && dragging => {
                if let Some(intent) = input.sample(session.player_position()) {
                    session.apply_intent(intent, now_ms());
                }
            }
            _ = sleep_until(deadline.unwrap_or(start)), if deadline.is_some() => {
                session.expire_encounter(now_ms());
            }
            _ = sleep_until(resume_at.unwrap_or(start)), if resume_at.is_some() => {
                session.resume(now_ms());
            }
            command = commands.recv() => match command {
                None | Some(Command::Quit) => {
                    tracing::info!(session_id = session.session_id(), "session abandoned");
                    return None;
                }
                Some(command) => apply_command(session, &mut input, command, now_ms()),
            },
        }

        observe(&session.build_snapshot(true));
    }

    session.take_outcome()
}

fn apply_command(session: &mut Session, input: &mut InputAdapter, command: Command, now_ms: u64) {
    match command {
        Command::Key(key) => {
            session.apply_intent(input.on_key(key), now_ms);
        }
        Command::Pointer(event) => {
            if !session.timers_running() {
                return;
            }
            if let Some(intent) = input.on_pointer(event) {
                session.apply_intent(intent, now_ms);
            }
        }
        Command::Answer(choice) => {
            session.submit_answer(choice, now_ms);
        }
        Command::Quit => {}
    }
}
