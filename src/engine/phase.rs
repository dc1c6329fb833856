//! Session phases and the pure transition function that moves between them.

use serde::Serialize;

use crate::types::DefeatCause;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phase {
    Exploring,
    Encounter {
        #[serde(rename = "chestId")]
        chest_id: u32,
    },
    Victory,
    Defeat {
        cause: DefeatCause,
    },
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat { .. })
    }

    /// Countdown and hostile timers only run while exploring.
    pub fn timers_running(self) -> bool {
        self == Self::Exploring
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    OpenChest { chest_id: u32 },
    EncounterResolved,
    PortalReached { keys_collected: u32, keys_required: u32 },
    /// Counter check after a tick or an applied penalty.
    Counters { time_remaining: u32, lives: u32 },
}

pub fn transition(phase: Phase, event: PhaseEvent) -> Phase {
    if phase.is_terminal() {
        return phase;
    }
    match (phase, event) {
        (Phase::Exploring, PhaseEvent::OpenChest { chest_id }) => Phase::Encounter { chest_id },
        (Phase::Encounter { .. }, PhaseEvent::EncounterResolved) => Phase::Exploring,
        (
            Phase::Exploring,
            PhaseEvent::PortalReached {
                keys_collected,
                keys_required,
            },
        ) if keys_collected >= keys_required => Phase::Victory,
        (
            Phase::Exploring,
            PhaseEvent::Counters {
                time_remaining,
                lives,
            },
        ) => match defeat_cause(time_remaining, lives) {
            Some(cause) => Phase::Defeat { cause },
            None => Phase::Exploring,
        },
        (current, _) => current,
    }
}

/// Timeout is checked before lives so a tick where both run out records a
/// single cause.
pub fn defeat_cause(time_remaining: u32, lives: u32) -> Option<DefeatCause> {
    if time_remaining == 0 {
        return Some(DefeatCause::Timeout);
    }
    if lives == 0 {
        return Some(DefeatCause::Lives);
    }
    None
}
