//! Debounced Present/Away state machine.
//!
//! Raw per-frame classification is noisy: a blink or a single dropped
//! detection must not raise an alert. A transition to `Away` is committed
//! only after a run of consecutive away frames:
//!
//! - `FaceAway` frames commit after `away_threshold` frames.
//! - `NoFace` frames commit after `away_threshold * no_face_multiplier`
//!   frames. A missing face is a stronger signal but also what a transient
//!   detector miss looks like, so it gets the longer grace period.
//!
//! Both kinds of frame share one counter. Recovery to `Present` happens on the
//! first `FacePresent` frame, without hysteresis.

use serde::{Deserialize, Serialize};

use crate::risk::{record_away_event, RiskConfig};
use crate::state::{AttentionState, FrameSignal, MonitorEvent, Presence, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive `FaceAway` frames needed to commit a transition.
    pub away_threshold: u32,
    /// Multiplier applied to `away_threshold` for `NoFace` frames.
    pub no_face_multiplier: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            away_threshold: 5,
            no_face_multiplier: 2,
        }
    }
}

impl DebounceConfig {
    /// Consecutive frames of `signal` that commit a transition to `Away`.
    pub fn frames_required(&self, signal: FrameSignal) -> Option<u32> {
        match signal {
            FrameSignal::FaceAway => Some(self.away_threshold),
            FrameSignal::NoFace => {
                Some(self.away_threshold.saturating_mul(self.no_face_multiplier))
            }
            FrameSignal::FacePresent => None,
        }
    }
}

/// Result of feeding one frame signal to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: AttentionState,
    pub events: Vec<MonitorEvent>,
}

/// Advance the state machine by one frame.
///
/// Pure: the caller owns the state and decides what to do with the events.
/// Only the `Present -> Away` edge reaches the risk scorer, so a sustained
/// away period is counted once.
pub fn step(
    state: AttentionState,
    signal: FrameSignal,
    debounce: &DebounceConfig,
    risk: &RiskConfig,
) -> Step {
    let mut next = state;
    let mut events = Vec::new();

    match debounce.frames_required(signal) {
        None => {
            next.consecutive_away_frames = 0;
            if next.state == Presence::Away {
                next.state = Presence::Present;
                events.push(MonitorEvent::Transition(Transition {
                    state: Presence::Present,
                    cause: signal,
                    risk_score: next.risk_score,
                    away_event_count: next.away_event_count,
                }));
            }
        }
        Some(required) => {
            next.consecutive_away_frames = next.consecutive_away_frames.saturating_add(1);
            if next.consecutive_away_frames >= required && next.state == Presence::Present {
                next = record_away_event(next, signal, risk);
                next.state = Presence::Away;
                next.consecutive_away_frames = 0;
                events.push(MonitorEvent::Transition(Transition {
                    state: Presence::Away,
                    cause: signal,
                    risk_score: next.risk_score,
                    away_event_count: next.away_event_count,
                }));
            }
        }
    }

    Step {
        state: next,
        events,
    }
}
