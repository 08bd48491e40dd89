//! Collaborator traits at the edges of the estimator.

use thiserror::Error;

use crate::landmarks::LandmarkSet;
use crate::state::Transition;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// The detector could not produce a result for this frame.
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    /// A finite source has no more frames.
    #[error("landmark source exhausted")]
    Exhausted,
}

/// Produces the landmarks of the current frame.
///
/// Implementations own frame acquisition (camera, video file, recording) and
/// the detector. `Ok(None)` means the frame was processed and no face was found.
pub trait LandmarkSource {
    fn detect(&mut self) -> Result<Option<LandmarkSet>, DetectorError>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn detect(&mut self) -> Result<Option<LandmarkSet>, DetectorError> {
        (**self).detect()
    }
}

/// Receives state changes to drive alerts and UI.
///
/// `on_transition` fires only when the debounced state changes, never on
/// every tick.
pub trait AlertSink {
    fn on_transition(&mut self, transition: &Transition);

    fn on_reset(&mut self);

    fn on_detector_unavailable(&mut self, _error: &DetectorError) {}

    fn on_session_started(&mut self, _session: &str) {}

    fn on_session_stopped(&mut self, _session: &str) {}
}

impl<A: AlertSink + ?Sized> AlertSink for Box<A> {
    fn on_transition(&mut self, transition: &Transition) {
        (**self).on_transition(transition)
    }

    fn on_reset(&mut self) {
        (**self).on_reset()
    }

    fn on_detector_unavailable(&mut self, error: &DetectorError) {
        (**self).on_detector_unavailable(error)
    }

    fn on_session_started(&mut self, session: &str) {
        (**self).on_session_started(session)
    }

    fn on_session_stopped(&mut self, session: &str) {
        (**self).on_session_stopped(session)
    }
}

/// Alert sink that records everything it receives.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSink {
    pub transitions: Vec<Transition>,
    pub resets: usize,
    pub detector_errors: Vec<DetectorError>,
    pub sessions_started: Vec<String>,
    pub sessions_stopped: Vec<String>,
}

impl AlertSink for RecordingSink {
    fn on_transition(&mut self, transition: &Transition) {
        self.transitions.push(*transition);
    }

    fn on_reset(&mut self) {
        self.resets += 1;
    }

    fn on_detector_unavailable(&mut self, error: &DetectorError) {
        self.detector_errors.push(error.clone());
    }

    fn on_session_started(&mut self, session: &str) {
        self.sessions_started.push(session.to_string());
    }

    fn on_session_stopped(&mut self, session: &str) {
        self.sessions_stopped.push(session.to_string());
    }
}
