//! Per-frame "looking away" decision.

use serde::{Deserialize, Serialize};

use crate::landmarks::LandmarkSet;
use crate::pose::{estimate_direction, DirectionVector};
use crate::state::FrameSignal;

/// Default off-axis threshold on either direction component.
pub const DEFAULT_OFF_AXIS_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A frame is away when `|x|` or `|y|` exceeds this value.
    pub off_axis_threshold: f32,
    /// Faces narrower than this (jaw span, pixels) count as away.
    /// A subject leaning far back or a face at the edge of frame shows up small.
    pub min_face_width: Option<f32>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            off_axis_threshold: DEFAULT_OFF_AXIS_THRESHOLD,
            min_face_width: None,
        }
    }
}

/// True when the direction deviates beyond the threshold on either axis.
pub fn classify(direction: DirectionVector, config: &ClassifierConfig) -> bool {
    direction.x.abs() > config.off_axis_threshold || direction.y.abs() > config.off_axis_threshold
}

/// Map one detection outcome to the signal consumed by the debouncer.
///
/// Degenerate geometry is reported as [`FrameSignal::NoFace`], as if the
/// detector had found nothing.
pub fn signal_for(detection: Option<&LandmarkSet>, config: &ClassifierConfig) -> FrameSignal {
    let Some(landmarks) = detection else {
        return FrameSignal::NoFace;
    };

    let direction = match estimate_direction(landmarks) {
        Ok(direction) => direction,
        Err(e) => {
            tracing::debug!(error = %e, "pose estimation failed; treating frame as no face");
            return FrameSignal::NoFace;
        }
    };

    if let Some(min_width) = config.min_face_width {
        let width = landmarks.face_width();
        if width < min_width {
            tracing::trace!(width, min_width, "face below minimum width");
            return FrameSignal::FaceAway;
        }
    }

    if classify(direction, config) {
        FrameSignal::FaceAway
    } else {
        FrameSignal::FacePresent
    }
}
