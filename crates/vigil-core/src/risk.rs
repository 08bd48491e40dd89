//! Risk scoring of committed away events.
//!
//! Each `Present -> Away` transition counts as one away event. The score is a
//! bounded 0-100 value derived from the running event count and the weight of
//! the signal that triggered the event.

use serde::{Deserialize, Serialize};

use crate::state::{AttentionState, FrameSignal};

/// Upper bound of the risk score.
pub const MAX_RISK_SCORE: u8 = 100;

/// How the score is derived from the event count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// `count * weight_of_latest_event`. Earlier events are rescored at the
    /// weight of the most recent one.
    #[default]
    LastWeight,
    /// Running sum of each event's own weight.
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of an event triggered by a turned-away face.
    pub face_away_weight: u8,
    /// Weight of an event triggered by a missing face.
    pub no_face_weight: u8,
    pub mode: ScoringMode,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            face_away_weight: 20,
            no_face_weight: 25,
            mode: ScoringMode::LastWeight,
        }
    }
}

impl RiskConfig {
    /// Weight of an away event triggered by `cause`. `FacePresent` never
    /// triggers an away event and weighs nothing.
    pub fn weight(&self, cause: FrameSignal) -> u8 {
        match cause {
            FrameSignal::FaceAway => self.face_away_weight,
            FrameSignal::NoFace => self.no_face_weight,
            FrameSignal::FacePresent => 0,
        }
    }
}

/// Count one away event and rescore.
///
/// The returned score never drops below the previous one.
pub fn record_away_event(
    state: AttentionState,
    cause: FrameSignal,
    config: &RiskConfig,
) -> AttentionState {
    let away_event_count = state.away_event_count.saturating_add(1);
    let weight = u32::from(config.weight(cause));
    let max = u32::from(MAX_RISK_SCORE);

    let computed = match config.mode {
        ScoringMode::LastWeight => away_event_count.saturating_mul(weight).min(max),
        ScoringMode::Cumulative => (u32::from(state.risk_score) + weight).min(max),
    };
    // computed <= 100, the cast cannot truncate
    let risk_score = (computed as u8).max(state.risk_score);

    AttentionState {
        away_event_count,
        risk_score,
        ..state
    }
}
