//! Attention state record and the events emitted when it changes.

use serde::{Deserialize, Serialize};

/// Debounced presence of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Present,
    Away,
}

/// Per-frame classification fed to the debounce state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSignal {
    FaceAway,
    FacePresent,
    NoFace,
}

/// Everything the estimator remembers between ticks.
///
/// `consecutive_away_frames` is a trigger counter: it is cleared on any
/// `FacePresent` frame and again the moment a transition to `Away` fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttentionState {
    pub state: Presence,
    pub consecutive_away_frames: u32,
    pub away_event_count: u32,
    /// Bounded to 0..=100.
    pub risk_score: u8,
}

impl AttentionState {
    pub fn is_away(&self) -> bool {
        self.state == Presence::Away
    }
}

/// A committed change of [`Presence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Presence,
    /// Frame signal that committed the transition.
    pub cause: FrameSignal,
    pub risk_score: u8,
    pub away_event_count: u32,
}

/// Notification produced by a state update, delivered to the alert sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    Transition(Transition),
    Reset,
}
