//! `vigil replay` — runs a recorded landmark stream through the estimator.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use vigil_core::{
    AttentionConfig, AttentionMonitor, AttentionState, DetectorError, FrameSignal,
    LandmarkSource, Presence, RecordingSink, ReplaySource, ScoringMode, TickOutcome, Transition,
};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Recording in JSON Lines format (one detector result per line)
    pub file: PathBuf,

    /// Off-axis threshold on either direction component
    #[arg(long)]
    pub off_axis_threshold: Option<f32>,

    /// Consecutive turned-away frames before an away event
    #[arg(long)]
    pub away_threshold: Option<u32>,

    /// Faces narrower than this many pixels count as away
    #[arg(long)]
    pub min_face_width: Option<f32>,

    /// Score each away event at its own weight instead of the latest one
    #[arg(long)]
    pub cumulative: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl ReplayArgs {
    fn attention_config(&self) -> Result<AttentionConfig> {
        let mut config = AttentionConfig::default();
        if let Some(threshold) = self.off_axis_threshold {
            config.classifier.off_axis_threshold = threshold;
        }
        if let Some(frames) = self.away_threshold {
            config.debounce.away_threshold = frames;
        }
        config.classifier.min_face_width = self.min_face_width;
        if self.cumulative {
            config.risk.mode = ScoringMode::Cumulative;
        }
        config.validate().context("invalid estimator settings")?;
        Ok(config)
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TimedTransition {
    /// 1-based index of the frame that committed the transition.
    pub frame: usize,
    #[serde(flatten)]
    pub transition: Transition,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReplayReport {
    pub frames: usize,
    pub skipped: usize,
    pub no_face_frames: usize,
    pub away_frames: usize,
    pub transitions: Vec<TimedTransition>,
    #[serde(rename = "final")]
    pub final_state: AttentionState,
}

/// Feed every frame of `source` through a fresh monitor.
pub fn replay(source: &mut dyn LandmarkSource, config: AttentionConfig) -> ReplayReport {
    let mut monitor = AttentionMonitor::new(config);
    let mut sink = RecordingSink::default();
    monitor.start("replay", &mut sink);

    let mut report = ReplayReport {
        frames: 0,
        skipped: 0,
        no_face_frames: 0,
        away_frames: 0,
        transitions: Vec::new(),
        final_state: AttentionState::default(),
    };

    while let Some(ticket) = monitor.begin_tick() {
        let detection = source.detect();
        if matches!(detection, Err(DetectorError::Exhausted)) {
            break;
        }
        report.frames += 1;

        let before = sink.transitions.len();
        match monitor.complete_tick(ticket, detection, &mut sink) {
            TickOutcome::Applied { signal, .. } => match signal {
                FrameSignal::NoFace => report.no_face_frames += 1,
                FrameSignal::FaceAway => report.away_frames += 1,
                FrameSignal::FacePresent => {}
            },
            TickOutcome::Skipped => report.skipped += 1,
            TickOutcome::Discarded | TickOutcome::Idle => {}
        }
        let frame = report.frames;
        report.transitions.extend(
            sink.transitions[before..]
                .iter()
                .map(|&transition| TimedTransition { frame, transition }),
        );
    }

    report.final_state = monitor.state();
    report
}

pub fn run(args: &ReplayArgs) -> Result<()> {
    let config = args.attention_config()?;
    let mut source = ReplaySource::open(&args.file, false)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    let report = replay(&mut source, config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for t in &report.transitions {
        println!("  frame {:>6}  {}", t.frame, describe(&t.transition));
    }
    println!();
    println!(
        "frames: {} (no face: {}, looking away: {}, detector errors: {})",
        report.frames, report.no_face_frames, report.away_frames, report.skipped
    );
    let status = match report.final_state.state {
        Presence::Present => "normal",
        Presence::Away => "warning",
    };
    println!("status: {status}");
    println!("looking away count: {}", report.final_state.away_event_count);
    println!("risk score: {}%", report.final_state.risk_score);
    Ok(())
}

fn describe(t: &Transition) -> String {
    match (t.state, t.cause) {
        (Presence::Away, FrameSignal::NoFace) => format!(
            "face not detected (risk {}%, event #{})",
            t.risk_score, t.away_event_count
        ),
        (Presence::Away, _) => format!(
            "looking away (risk {}%, event #{})",
            t.risk_score, t.away_event_count
        ),
        (Presence::Present, _) => "back on screen".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(lines: &[&str]) -> ReplaySource {
        ReplaySource::from_reader(lines.join("\n").as_bytes(), false).unwrap()
    }

    const FRONTAL: &str = r#"{"jaw": [[0, 25], [50, 100], [100, 25]], "nose": [[50, 50]], "left_eye": [[40, 50]], "right_eye": [[60, 50]]}"#;
    const TURNED: &str = r#"{"jaw": [[0, 25], [50, 100], [100, 25]], "nose": [[50, 50]], "left_eye": [[70, 50]], "right_eye": [[90, 50]]}"#;

    #[test]
    fn test_replay_counts_transitions_with_frames() {
        let mut lines = vec![TURNED; 5];
        lines.push(FRONTAL);
        lines.extend(["null"; 10]);
        let mut source = recording(&lines);

        let report = replay(&mut source, AttentionConfig::default());
        assert_eq!(report.frames, 16);
        assert_eq!(report.away_frames, 5);
        assert_eq!(report.no_face_frames, 10);

        let frames: Vec<usize> = report.transitions.iter().map(|t| t.frame).collect();
        assert_eq!(frames, vec![5, 6, 16]);
        // Second event scored at the no-face weight: 2 * 25
        assert_eq!(report.final_state.away_event_count, 2);
        assert_eq!(report.final_state.risk_score, 50);
    }

    #[test]
    fn test_replay_counts_detector_errors() {
        let mut source = recording(&["null", r#"{"error": "dropped frame"}"#, "null"]);
        let report = replay(&mut source, AttentionConfig::default());
        assert_eq!(report.frames, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.final_state.consecutive_away_frames, 2);
    }

    #[test]
    fn test_cli_flags_build_config() {
        let args = ReplayArgs {
            file: PathBuf::from("x.jsonl"),
            off_axis_threshold: Some(0.2),
            away_threshold: Some(3),
            min_face_width: None,
            cumulative: true,
            json: false,
        };
        let config = args.attention_config().unwrap();
        assert_eq!(config.classifier.off_axis_threshold, 0.2);
        assert_eq!(config.debounce.away_threshold, 3);
        assert_eq!(config.risk.mode, ScoringMode::Cumulative);
    }

    #[test]
    fn test_describe_transitions() {
        let t = Transition {
            state: Presence::Away,
            cause: FrameSignal::NoFace,
            risk_score: 25,
            away_event_count: 1,
        };
        assert_eq!(describe(&t), "face not detected (risk 25%, event #1)");
    }
}
