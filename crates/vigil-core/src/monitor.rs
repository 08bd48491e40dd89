//! Session controller owning the attention state.
//!
//! [`AttentionMonitor`] is the only mutator of [`AttentionState`]. Hosts drive
//! it one tick at a time; a tick is split into [`AttentionMonitor::begin_tick`]
//! and [`AttentionMonitor::complete_tick`] so the detector call in between can
//! suspend (await, run on another thread) without the monitor being borrowed.
//! Results carrying a ticket from before the latest `stop`/`start` are dropped.

use crate::classifier::signal_for;
use crate::config::AttentionConfig;
use crate::debounce::step;
use crate::landmarks::LandmarkSet;
use crate::ports::{AlertSink, DetectorError, LandmarkSource};
use crate::state::{AttentionState, FrameSignal, MonitorEvent};

/// Proof that a tick was started during a given session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct TickTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame signal was applied to the state.
    Applied {
        signal: FrameSignal,
        events: Vec<MonitorEvent>,
    },
    /// The detector failed; the state is unchanged.
    Skipped,
    /// The result arrived after the session it belonged to was stopped.
    Discarded,
    /// No session is running.
    Idle,
}

pub struct AttentionMonitor {
    config: AttentionConfig,
    state: AttentionState,
    session: Option<String>,
    generation: u64,
}

impl AttentionMonitor {
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            config,
            state: AttentionState::default(),
            session: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn state(&self) -> AttentionState {
        self.state
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Begin scheduling ticks under `session`. Returns false if a session is
    /// already running, in which case nothing changes.
    pub fn start(&mut self, session: impl Into<String>, sink: &mut dyn AlertSink) -> bool {
        if self.session.is_some() {
            return false;
        }
        let session = session.into();
        self.generation = self.generation.wrapping_add(1);
        tracing::info!(session = %session, "monitoring session started");
        sink.on_session_started(&session);
        self.session = Some(session);
        true
    }

    /// Stop the session and clear the state. Any detection still in flight
    /// will be discarded when it completes. Returns false if not running.
    pub fn stop(&mut self, sink: &mut dyn AlertSink) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.generation = self.generation.wrapping_add(1);
        self.state = AttentionState::default();
        tracing::info!(session = %session, "monitoring session stopped");
        sink.on_session_stopped(&session);
        true
    }

    /// Clear counters and score. Callable at any time, running or not.
    pub fn reset(&mut self, sink: &mut dyn AlertSink) {
        self.state = AttentionState::default();
        tracing::info!("attention state reset");
        sink.on_reset();
    }

    /// Start a tick. `None` when no session is running.
    pub fn begin_tick(&self) -> Option<TickTicket> {
        self.session.as_ref().map(|_| TickTicket {
            generation: self.generation,
        })
    }

    /// Apply the detector result obtained for `ticket`.
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        detection: Result<Option<LandmarkSet>, DetectorError>,
        sink: &mut dyn AlertSink,
    ) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        if ticket.generation != self.generation {
            tracing::debug!("discarding detection from a stopped session");
            return TickOutcome::Discarded;
        }

        let landmarks = match detection {
            Ok(landmarks) => landmarks,
            Err(e) => {
                tracing::debug!(error = %e, "detector unavailable; skipping tick");
                sink.on_detector_unavailable(&e);
                return TickOutcome::Skipped;
            }
        };

        let signal = signal_for(landmarks.as_ref(), &self.config.classifier);
        let next = step(self.state, signal, &self.config.debounce, &self.config.risk);
        self.state = next.state;

        for event in &next.events {
            if let MonitorEvent::Transition(transition) = event {
                sink.on_transition(transition);
            }
        }

        TickOutcome::Applied {
            signal,
            events: next.events,
        }
    }

    /// Run a whole tick synchronously against `source`.
    pub fn tick(
        &mut self,
        source: &mut dyn LandmarkSource,
        sink: &mut dyn AlertSink,
    ) -> TickOutcome {
        let Some(ticket) = self.begin_tick() else {
            return TickOutcome::Idle;
        };
        let detection = source.detect();
        self.complete_tick(ticket, detection, sink)
    }
}
