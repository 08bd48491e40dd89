use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use vigil_core::{
    AlertSink, AttentionConfig, AttentionMonitor, AttentionState, DetectorError, LandmarkSet,
    LandmarkSource, TickOutcome, TickTicket,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine task exited")]
    ChannelClosed,
}

type Detection = Result<Option<LandmarkSet>, DetectorError>;

/// Snapshot of the monitor returned by [`MonitorHandle::status`].
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub session: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_transition_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attention: AttentionState,
}

/// Messages sent from D-Bus handlers to the engine task.
enum EngineRequest {
    Start { reply: oneshot::Sender<String> },
    Stop { reply: oneshot::Sender<bool> },
    Reset { reply: oneshot::Sender<()> },
    Status { reply: oneshot::Sender<MonitorStatus> },
}

/// Clone-safe handle to the engine task.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl MonitorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Start a monitoring session. Returns the session id; if a session is
    /// already running its id is returned and nothing changes.
    pub async fn start(&self) -> Result<String, EngineError> {
        self.request(|reply| EngineRequest::Start { reply }).await
    }

    /// Stop the running session and clear its state. Returns false if idle.
    pub async fn stop(&self) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::Stop { reply }).await
    }

    /// Reset counters and risk score.
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineRequest::Reset { reply }).await
    }

    pub async fn status(&self) -> Result<MonitorStatus, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }
}

/// Spawn the engine task.
///
/// The task is the sole owner of the [`AttentionMonitor`]. Ticks are
/// scheduled every `tick_interval` while a session is running, and never
/// overlap: the next detection starts only after the previous one was
/// applied. Detection runs on the blocking pool; control requests are
/// served while it is in flight.
///
/// Must be called from within a tokio runtime.
pub fn spawn_engine(
    config: AttentionConfig,
    tick_interval: Duration,
    source: Box<dyn LandmarkSource + Send>,
    sink: Box<dyn AlertSink + Send>,
) -> MonitorHandle {
    let (tx, rx) = mpsc::channel::<EngineRequest>(8);
    let engine = Engine {
        monitor: AttentionMonitor::new(config),
        source: Arc::new(Mutex::new(source)),
        sink,
        started_at: None,
        last_transition_at: None,
    };
    tokio::spawn(engine.run(rx, tick_interval));
    MonitorHandle { tx }
}

struct Engine {
    monitor: AttentionMonitor,
    source: Arc<Mutex<Box<dyn LandmarkSource + Send>>>,
    sink: Box<dyn AlertSink + Send>,
    started_at: Option<DateTime<Utc>>,
    last_transition_at: Option<DateTime<Utc>>,
}

impl Engine {
    async fn run(mut self, mut rx: mpsc::Receiver<EngineRequest>, tick_interval: Duration) {
        tracing::info!(interval_ms = tick_interval.as_millis() as u64, "engine task started");

        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inflight: Option<(TickTicket, JoinHandle<Detection>)> = None;

        loop {
            tokio::select! {
                req = rx.recv() => match req {
                    Some(req) => self.handle(req),
                    None => break,
                },
                _ = interval.tick(), if inflight.is_none() && self.monitor.is_running() => {
                    if let Some(ticket) = self.monitor.begin_tick() {
                        inflight = Some((ticket, self.spawn_detection()));
                    }
                }
                joined = async {
                    match inflight.as_mut() {
                        Some((_, handle)) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if inflight.is_some() => {
                    if let Some((ticket, _)) = inflight.take() {
                        let detection = joined.unwrap_or_else(|e| {
                            Err(DetectorError::Unavailable(format!("detector task failed: {e}")))
                        });
                        self.apply(ticket, detection);
                    }
                }
            }
        }

        tracing::info!("engine task exiting");
    }

    fn spawn_detection(&self) -> JoinHandle<Detection> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            // A panicking detector poisons the lock; the source itself is
            // still usable for the next frame.
            let mut source = source.lock().unwrap_or_else(PoisonError::into_inner);
            source.detect()
        })
    }

    fn apply(&mut self, ticket: TickTicket, detection: Detection) {
        let exhausted = matches!(detection, Err(DetectorError::Exhausted));
        match self.monitor.complete_tick(ticket, detection, self.sink.as_mut()) {
            TickOutcome::Applied { events, .. } if !events.is_empty() => {
                self.last_transition_at = Some(Utc::now());
            }
            TickOutcome::Skipped if exhausted => {
                tracing::info!("landmark source exhausted; ending session");
                self.stop();
            }
            _ => {}
        }
    }

    fn handle(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::Start { reply } => {
                let session = self.start();
                let _ = reply.send(session);
            }
            EngineRequest::Stop { reply } => {
                let _ = reply.send(self.stop());
            }
            EngineRequest::Reset { reply } => {
                self.monitor.reset(self.sink.as_mut());
                self.last_transition_at = None;
                let _ = reply.send(());
            }
            EngineRequest::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn start(&mut self) -> String {
        if let Some(session) = self.monitor.session() {
            tracing::debug!(session, "start requested while running");
            return session.to_string();
        }
        let session = uuid::Uuid::new_v4().to_string();
        self.monitor.start(session.clone(), self.sink.as_mut());
        self.started_at = Some(Utc::now());
        self.last_transition_at = None;
        session
    }

    fn stop(&mut self) -> bool {
        let stopped = self.monitor.stop(self.sink.as_mut());
        if stopped {
            self.started_at = None;
            self.last_transition_at = None;
        }
        stopped
    }

    fn status(&self) -> MonitorStatus {
        MonitorStatus {
            running: self.monitor.is_running(),
            session: self.monitor.session().map(str::to_string),
            started_at: self.started_at,
            last_transition_at: self.last_transition_at,
            attention: self.monitor.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Presence, ReplaySource};

    /// Source whose frames are handed over one at a time by the test.
    struct GatedSource {
        entered: mpsc::UnboundedSender<()>,
        release: std::sync::mpsc::Receiver<Detection>,
    }

    impl LandmarkSource for GatedSource {
        fn detect(&mut self) -> Detection {
            let _ = self.entered.send(());
            self.release.recv().unwrap_or(Err(DetectorError::Exhausted))
        }
    }

    struct Gate {
        entered: mpsc::UnboundedReceiver<()>,
        release: std::sync::mpsc::Sender<Detection>,
    }

    impl Gate {
        /// Wait until the engine asks for a frame.
        async fn wait_for_detect(&mut self) {
            tokio::time::timeout(Duration::from_secs(5), self.entered.recv())
                .await
                .expect("engine never called detect")
                .expect("source dropped");
        }

        /// Answer the pending detect call and wait for the next one, so the
        /// answer has been applied when this returns.
        async fn feed(&mut self, detection: Detection) {
            self.release.send(detection).unwrap();
            self.wait_for_detect().await;
        }
    }

    struct NullSink;

    impl AlertSink for NullSink {
        fn on_transition(&mut self, _: &vigil_core::Transition) {}
        fn on_reset(&mut self) {}
    }

    fn gated_engine() -> (MonitorHandle, Gate) {
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let handle = spawn_engine(
            AttentionConfig::default(),
            Duration::from_millis(1),
            Box::new(GatedSource {
                entered: entered_tx,
                release: release_rx,
            }),
            Box::new(NullSink),
        );
        (
            handle,
            Gate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }

    #[tokio::test]
    async fn test_idle_until_started() {
        let (handle, _gate) = gated_engine();
        let status = handle.status().await.unwrap();
        assert!(!status.running);
        assert!(status.session.is_none());
        assert_eq!(status.attention, AttentionState::default());
    }

    #[tokio::test]
    async fn test_ten_missing_faces_raise_risk() {
        let (handle, mut gate) = gated_engine();
        handle.start().await.unwrap();
        gate.wait_for_detect().await;
        for _ in 0..10 {
            gate.feed(Ok(None)).await;
        }

        let status = handle.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.attention.state, Presence::Away);
        assert_eq!(status.attention.away_event_count, 1);
        assert_eq!(status.attention.risk_score, 25);
        assert!(status.last_transition_at.is_some());
    }

    #[tokio::test]
    async fn test_reset_while_running() {
        let (handle, mut gate) = gated_engine();
        handle.start().await.unwrap();
        gate.wait_for_detect().await;
        for _ in 0..10 {
            gate.feed(Ok(None)).await;
        }

        handle.reset().await.unwrap();
        let status = handle.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.attention, AttentionState::default());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (handle, _gate) = gated_engine();
        let first = handle.start().await.unwrap();
        let second = handle.start().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_result_in_flight_at_stop_is_discarded() {
        let (handle, mut gate) = gated_engine();
        let first = handle.start().await.unwrap();
        gate.wait_for_detect().await;

        // Detection for the first session is still pending.
        assert!(handle.stop().await.unwrap());
        let second = handle.start().await.unwrap();
        assert_ne!(first, second);

        gate.feed(Ok(None)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.session.as_deref(), Some(second.as_str()));
        assert_eq!(status.attention.consecutive_away_frames, 0);

        // Results for the new session are applied.
        gate.feed(Ok(None)).await;
        let status = handle.status().await.unwrap();
        assert_eq!(status.attention.consecutive_away_frames, 1);
    }

    #[tokio::test]
    async fn test_detector_failure_leaves_state_untouched() {
        let (handle, mut gate) = gated_engine();
        handle.start().await.unwrap();
        gate.wait_for_detect().await;
        gate.feed(Ok(None)).await;
        gate.feed(Err(DetectorError::Unavailable("glitch".into()))).await;

        let status = handle.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.attention.consecutive_away_frames, 1);
    }

    #[tokio::test]
    async fn test_exhausted_recording_ends_session() {
        let source = ReplaySource::from_reader("null\nnull\n".as_bytes(), false).unwrap();
        let handle = spawn_engine(
            AttentionConfig::default(),
            Duration::from_millis(1),
            Box::new(source),
            Box::new(NullSink),
        );
        handle.start().await.unwrap();

        let stopped = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if !handle.status().await.unwrap().running {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(stopped.is_ok());
        assert_eq!(
            handle.status().await.unwrap().attention,
            AttentionState::default()
        );
    }
}
