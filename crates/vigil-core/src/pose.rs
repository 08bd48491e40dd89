//! Head direction estimation from 2-D landmark geometry.
//!
//! This is not a head-pose solver. It measures how far the eye line sits from
//! the centre of the jaw outline (horizontal) and how far the nose bridge sits
//! below the eyes relative to the eye-to-chin span (vertical). A frontal,
//! centred face yields values near zero on both axes; turning or tilting the
//! head pushes one of them away from zero.
//!
//! Both components are dimensionless, so the result does not depend on how
//! close the subject sits to the camera.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::{centroid, LandmarkSet};

/// Normalized deviation from a centred frontal pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectionVector {
    /// Horizontal eye-line offset relative to face width.
    pub x: f32,
    /// Vertical nose-to-eye offset relative to the eye-to-chin span.
    pub y: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// Landmarks cannot be normalized: an empty sequence, a zero-width jaw,
    /// eyes level with the chin, or a non-finite result.
    #[error("degenerate landmark geometry: {0}")]
    DegenerateGeometry(&'static str),
}

/// Estimate the direction vector of a detected face.
///
/// Pure function of its input. Fails with [`PoseError::DegenerateGeometry`]
/// whenever a denominator is zero or a required sequence is empty; callers
/// treat that the same as a frame without a face.
pub fn estimate_direction(landmarks: &LandmarkSet) -> Result<DirectionVector, PoseError> {
    let face_center = centroid(&landmarks.jaw)
        .ok_or(PoseError::DegenerateGeometry("empty jaw outline"))?;
    let left_eye = centroid(&landmarks.left_eye)
        .ok_or(PoseError::DegenerateGeometry("empty left eye"))?;
    let right_eye = centroid(&landmarks.right_eye)
        .ok_or(PoseError::DegenerateGeometry("empty right eye"))?;
    let nose_top = landmarks
        .nose_top()
        .ok_or(PoseError::DegenerateGeometry("empty nose"))?;
    let eye_mid = left_eye.midpoint(right_eye);

    let (first, last, chin) = match (
        landmarks.jaw.first(),
        landmarks.jaw.last(),
        landmarks.chin(),
    ) {
        (Some(first), Some(last), Some(chin)) => (*first, *last, chin),
        _ => return Err(PoseError::DegenerateGeometry("empty jaw outline")),
    };

    let face_width = last.x - first.x;
    if face_width == 0.0 {
        return Err(PoseError::DegenerateGeometry("zero face width"));
    }

    let eye_to_chin = chin.y - eye_mid.y;
    if eye_to_chin == 0.0 {
        return Err(PoseError::DegenerateGeometry("zero eye-to-chin span"));
    }

    let direction = DirectionVector {
        x: (eye_mid.x - face_center.x) / face_width,
        y: (nose_top.y - eye_mid.y) / eye_to_chin,
    };

    if !direction.x.is_finite() || !direction.y.is_finite() {
        return Err(PoseError::DegenerateGeometry("non-finite direction"));
    }

    Ok(direction)
}
