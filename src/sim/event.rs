use serde::Serialize;

use crate::dynamics::State;
use crate::sim::phase::Phase;

// ---------------------------------------------------------------------------
// Phase transition events
// ---------------------------------------------------------------------------

/// Kinds of phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A new throwing interval begins (1-based).
    ThrowStart { interval: u32 },
    /// Throw rate fell below the threshold; the thrower rests.
    Fatigued,
    /// Last marble thrown; coasting from here on.
    Exhausted,
    /// Target distance reached.
    Arrived,
}

impl EventKind {
    /// Event for a transition between two phases, if it is one worth reporting.
    pub fn from_transition(from: Phase, to: Phase, interval: u32) -> Option<Self> {
        match (from, to) {
            (_, Phase::Done) => Some(EventKind::Arrived),
            (Phase::Throwing, Phase::Coasting) => Some(EventKind::Exhausted),
            (Phase::Throwing, Phase::Resting) => Some(EventKind::Fatigued),
            (Phase::Resting, Phase::Throwing) => Some(EventKind::ThrowStart { interval }),
            _ => None,
        }
    }
}

/// A transition that occurred during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimEvent {
    pub time: f64,
    pub position: f64,
    pub velocity: f64,
    pub mass: f64,
    pub kind: EventKind,
}

impl SimEvent {
    pub fn new(kind: EventKind, state: &State) -> Self {
        Self {
            time: state.time,
            position: state.pos,
            velocity: state.vel,
            mass: state.mass,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrival_wins_from_any_phase() {
        for from in [Phase::Throwing, Phase::Resting, Phase::Coasting] {
            assert_eq!(
                EventKind::from_transition(from, Phase::Done, 1),
                Some(EventKind::Arrived)
            );
        }
    }

    #[test]
    fn staying_put_is_not_an_event() {
        assert_eq!(EventKind::from_transition(Phase::Throwing, Phase::Throwing, 1), None);
        assert_eq!(EventKind::from_transition(Phase::Coasting, Phase::Coasting, 1), None);
    }

    #[test]
    fn resuming_carries_interval_number() {
        assert_eq!(
            EventKind::from_transition(Phase::Resting, Phase::Throwing, 4),
            Some(EventKind::ThrowStart { interval: 4 })
        );
    }
}
