use vigil_core::{AlertSink, DetectorError, FrameSignal, Presence, Transition};

/// Alert sink that reports state changes through the daemon log.
///
/// Repeated detector failures are logged once per distinct message until the
/// next transition, to keep a dead camera from flooding the journal at frame
/// rate.
#[derive(Default)]
pub struct LogSink {
    last_detector_error: Option<String>,
}

impl AlertSink for LogSink {
    fn on_transition(&mut self, t: &Transition) {
        self.last_detector_error = None;
        match (t.state, t.cause) {
            (Presence::Away, FrameSignal::NoFace) => tracing::warn!(
                risk_score = t.risk_score,
                away_events = t.away_event_count,
                "face not detected; subject may have left the camera"
            ),
            (Presence::Away, _) => tracing::warn!(
                risk_score = t.risk_score,
                away_events = t.away_event_count,
                "subject looking away from the screen"
            ),
            (Presence::Present, _) => tracing::info!(
                risk_score = t.risk_score,
                away_events = t.away_event_count,
                "subject attention restored"
            ),
        }
    }

    fn on_reset(&mut self) {
        self.last_detector_error = None;
        tracing::info!("warnings reset");
    }

    fn on_detector_unavailable(&mut self, error: &DetectorError) {
        let message = error.to_string();
        if self.last_detector_error.as_deref() != Some(message.as_str()) {
            tracing::warn!(error = %message, "landmark detector unavailable");
            self.last_detector_error = Some(message);
        }
    }

    fn on_session_started(&mut self, session: &str) {
        tracing::info!(session, "monitoring has begun");
    }

    fn on_session_stopped(&mut self, session: &str) {
        self.last_detector_error = None;
        tracing::info!(session, "monitoring stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_error_deduplicated() {
        let mut sink = LogSink::default();
        let err = DetectorError::Unavailable("timeout".into());
        sink.on_detector_unavailable(&err);
        assert_eq!(sink.last_detector_error.as_deref(), Some("detector unavailable: timeout"));
        sink.on_detector_unavailable(&err);
        sink.on_reset();
        assert!(sink.last_detector_error.is_none());
    }
}
