//! Facial landmark value types handed over by an external detector.
//!
//! The estimator never sees detector-specific objects. A detector adapter
//! converts its output into a [`LandmarkSet`] once per processed frame and the
//! set is dropped after the tick that consumed it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of points in the standard 68-point face layout.
pub const FACE_68_POINT_COUNT: usize = 68;

const JAW: std::ops::Range<usize> = 0..17;
const NOSE: std::ops::Range<usize> = 27..36;
const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;

/// A 2-D coordinate in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Arithmetic mean of a point sequence, or `None` when it is empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f32;
    Some(Point::new(sum_x / n, sum_y / n))
}

#[derive(Error, Debug, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmark points, got {got}")]
    PointCount { expected: usize, got: usize },
}

/// Landmarks of a single detected face.
///
/// Sequences keep detector order: the jaw outline runs left to right with the
/// chin at its middle index, and `nose[0]` is the top of the nose bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub jaw: Vec<Point>,
    pub nose: Vec<Point>,
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
}

impl LandmarkSet {
    /// Split a 68-point face layout into its jaw, nose and eye sequences.
    pub fn from_68_points(points: &[Point]) -> Result<Self, LandmarkError> {
        if points.len() != FACE_68_POINT_COUNT {
            return Err(LandmarkError::PointCount {
                expected: FACE_68_POINT_COUNT,
                got: points.len(),
            });
        }

        Ok(Self {
            jaw: points[JAW].to_vec(),
            nose: points[NOSE].to_vec(),
            left_eye: points[LEFT_EYE].to_vec(),
            right_eye: points[RIGHT_EYE].to_vec(),
        })
    }

    /// Horizontal span of the jaw outline in pixels (always non-negative).
    ///
    /// Returns 0.0 for an empty outline.
    pub fn face_width(&self) -> f32 {
        match (self.jaw.first(), self.jaw.last()) {
            (Some(first), Some(last)) => (last.x - first.x).abs(),
            _ => 0.0,
        }
    }

    /// Chin-bottom point of the jaw outline.
    pub fn chin(&self) -> Option<Point> {
        self.jaw.get(self.jaw.len() / 2).copied()
    }

    /// Top of the nose bridge.
    pub fn nose_top(&self) -> Option<Point> {
        self.nose.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32, i as f32 * 2.0)).collect()
    }

    #[test]
    fn test_centroid_of_square() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        assert_eq!(centroid(&pts), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_centroid_empty_is_none() {
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn test_from_68_points_splits_regions() {
        let pts = numbered_points(68);
        let set = LandmarkSet::from_68_points(&pts).unwrap();
        assert_eq!(set.jaw.len(), 17);
        assert_eq!(set.nose.len(), 9);
        assert_eq!(set.left_eye.len(), 6);
        assert_eq!(set.right_eye.len(), 6);
        assert_eq!(set.jaw[0].x, 0.0);
        assert_eq!(set.nose[0].x, 27.0);
        assert_eq!(set.left_eye[0].x, 36.0);
        assert_eq!(set.right_eye[5].x, 47.0);
    }

    #[test]
    fn test_from_68_points_rejects_wrong_count() {
        let err = LandmarkSet::from_68_points(&numbered_points(5)).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::PointCount {
                expected: 68,
                got: 5
            }
        );
    }

    #[test]
    fn test_chin_is_middle_of_jaw() {
        let set = LandmarkSet::from_68_points(&numbered_points(68)).unwrap();
        assert_eq!(set.chin(), Some(Point::new(8.0, 16.0)));
        assert_eq!(set.nose_top(), Some(Point::new(27.0, 54.0)));
    }

    #[test]
    fn test_face_width_is_absolute() {
        let set = LandmarkSet {
            jaw: vec![Point::new(200.0, 0.0), Point::new(100.0, 0.0)],
            nose: vec![],
            left_eye: vec![],
            right_eye: vec![],
        };
        assert_eq!(set.face_width(), 100.0);
    }
}
