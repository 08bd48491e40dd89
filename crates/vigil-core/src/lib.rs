//! vigil-core — attention-state estimation for remote proctoring.
//!
//! Per tick, data flows one way:
//!
//! ```text
//! LandmarkSource -> estimate_direction -> classify -> debounce::step -> risk -> AlertSink
//! ```
//!
//! [`AttentionMonitor`] owns the state and drives that pipeline. Frame capture
//! and landmark detection live behind [`LandmarkSource`]; alerting and UI live
//! behind [`AlertSink`].

pub mod classifier;
pub mod config;
pub mod debounce;
pub mod landmarks;
pub mod monitor;
pub mod ports;
pub mod pose;
pub mod replay;
pub mod risk;
pub mod state;

pub use classifier::{classify, signal_for, ClassifierConfig};
pub use config::{AttentionConfig, ConfigError};
pub use debounce::{step, DebounceConfig, Step};
pub use landmarks::{LandmarkError, LandmarkSet, Point};
pub use monitor::{AttentionMonitor, TickOutcome, TickTicket};
pub use ports::{AlertSink, DetectorError, LandmarkSource, RecordingSink};
pub use pose::{estimate_direction, DirectionVector, PoseError};
pub use replay::{ReplayError, ReplaySource};
pub use risk::{RiskConfig, ScoringMode};
pub use state::{AttentionState, FrameSignal, MonitorEvent, Presence, Transition};
