use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::ClassifierConfig;
use crate::debounce::DebounceConfig;
use crate::risk::{RiskConfig, MAX_RISK_SCORE};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("off-axis threshold must be a finite non-negative number, got {0}")]
    OffAxisThreshold(f32),
    #[error("minimum face width must be a finite non-negative number, got {0}")]
    MinFaceWidth(f32),
    #[error("away threshold must be at least 1 frame")]
    AwayThreshold,
    #[error("no-face multiplier must be at least 1")]
    NoFaceMultiplier,
    #[error("{name} weight {value} exceeds the maximum risk score of 100")]
    Weight { name: &'static str, value: u8 },
}

/// Tunable constants of the estimator.
///
/// The defaults encode an uncalibrated heuristic; cameras and seating
/// positions differ enough that each deployment is expected to tune them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub risk: RiskConfig,
}

impl AttentionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.classifier.off_axis_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::OffAxisThreshold(threshold));
        }
        if let Some(width) = self.classifier.min_face_width {
            if !width.is_finite() || width < 0.0 {
                return Err(ConfigError::MinFaceWidth(width));
            }
        }
        if self.debounce.away_threshold == 0 {
            return Err(ConfigError::AwayThreshold);
        }
        if self.debounce.no_face_multiplier == 0 {
            return Err(ConfigError::NoFaceMultiplier);
        }
        for (name, value) in [
            ("face-away", self.risk.face_away_weight),
            ("no-face", self.risk.no_face_weight),
        ] {
            if value > MAX_RISK_SCORE {
                return Err(ConfigError::Weight { name, value });
            }
        }
        Ok(())
    }
}
