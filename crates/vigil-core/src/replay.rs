//! Landmark source replaying recorded detector output.
//!
//! Recordings are JSON Lines, one frame per line:
//!
//! ```text
//! null                                             no face in frame
//! {"points": [[x, y], ...]}                        68-point face layout
//! {"jaw": [...], "nose": [...], "left_eye": [...], "right_eye": [...]}
//! {"error": "camera timeout"}                      detector failure
//! ```
//!
//! Blank lines are ignored. Points may be written as `[x, y]` or `{"x": .., "y": ..}`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::landmarks::{LandmarkError, LandmarkSet, Point};
use crate::ports::{DetectorError, LandmarkSource};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid frame: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {source}")]
    Landmarks {
        line: usize,
        #[source]
        source: LandmarkError,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireFrame {
    Failure { error: String },
    Points { points: Vec<Point> },
    Named(LandmarkSet),
}

/// One recorded detector result.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedFrame {
    Face(LandmarkSet),
    NoFace,
    Failure(String),
}

impl RecordedFrame {
    fn into_detection(self) -> Result<Option<LandmarkSet>, DetectorError> {
        match self {
            RecordedFrame::Face(landmarks) => Ok(Some(landmarks)),
            RecordedFrame::NoFace => Ok(None),
            RecordedFrame::Failure(message) => Err(DetectorError::Unavailable(message)),
        }
    }
}

/// Parse one recording line. `Ok(None)` for blank lines.
pub fn parse_frame(line: &str, line_no: usize) -> Result<Option<RecordedFrame>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let wire: Option<WireFrame> = serde_json::from_str(trimmed).map_err(|source| {
        ReplayError::Parse {
            line: line_no,
            source,
        }
    })?;

    let frame = match wire {
        None => RecordedFrame::NoFace,
        Some(WireFrame::Failure { error }) => RecordedFrame::Failure(error),
        Some(WireFrame::Named(landmarks)) => RecordedFrame::Face(landmarks),
        Some(WireFrame::Points { points }) => {
            let landmarks = LandmarkSet::from_68_points(&points).map_err(|source| {
                ReplayError::Landmarks {
                    line: line_no,
                    source,
                }
            })?;
            RecordedFrame::Face(landmarks)
        }
    };
    Ok(Some(frame))
}

/// Replays a recording frame by frame.
pub struct ReplaySource {
    frames: Vec<RecordedFrame>,
    position: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<RecordedFrame>, looping: bool) -> Self {
        Self {
            frames,
            position: 0,
            looping,
        }
    }

    /// Load a recording from disk.
    pub fn open(path: &Path, looping: bool) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_reader(BufReader::new(file), looping).map_err(|e| match e {
            ReplayError::Io { source, .. } => ReplayError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!(
            path = %path.display(),
            frames = source.len(),
            looping,
            "recording loaded"
        );
        Ok(source)
    }

    pub fn from_reader<R: BufRead>(reader: R, looping: bool) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ReplayError::Io {
                path: PathBuf::new(),
                source,
            })?;
            if let Some(frame) = parse_frame(&line, idx + 1)? {
                frames.push(frame);
            }
        }
        Ok(Self::new(frames, looping))
    }

    /// Number of frames in the recording.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames not yet replayed in the current pass.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.position
    }
}

impl LandmarkSource for ReplaySource {
    fn detect(&mut self) -> Result<Option<LandmarkSet>, DetectorError> {
        if self.position >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(DetectorError::Exhausted);
            }
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        frame.into_detection()
    }
}
