use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use vigil_core::{AttentionConfig, ScoringMode};

/// Optional TOML file layered under the environment.
///
/// ```toml
/// replay_path = "/var/lib/vigil/session.jsonl"
/// tick_interval_ms = 33
///
/// [attention.classifier]
/// off_axis_threshold = 0.12
///
/// [attention.risk]
/// mode = "cumulative"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    attention: AttentionConfig,
    replay_path: Option<PathBuf>,
    replay_loop: Option<bool>,
    tick_interval_ms: Option<u64>,
    autostart: Option<bool>,
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug)]
pub struct Config {
    /// Estimator thresholds and weights.
    pub attention: AttentionConfig,
    /// Recorded landmark stream to monitor.
    pub replay_path: Option<PathBuf>,
    /// Restart the recording when it runs out.
    pub replay_loop: bool,
    /// Time between ticks in milliseconds (default 33, about 30 fps).
    pub tick_interval_ms: u64,
    /// Start a monitoring session as soon as the daemon is up.
    pub autostart: bool,
    /// Whether the daemon is running on the session bus (development mode).
    pub session_bus: bool,
}

impl Config {
    /// Load configuration from `VIGIL_*` environment variables with defaults,
    /// on top of the TOML file named by `VIGIL_CONFIG` if set.
    pub fn from_env() -> Result<Self> {
        Self::load(|key| std::env::var(key).ok())
    }

    fn load(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match var("VIGIL_CONFIG") {
            Some(path) => read_file_config(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let mut attention = file.attention;
        attention.classifier.off_axis_threshold = env_parse(
            &var,
            "VIGIL_OFF_AXIS_THRESHOLD",
            attention.classifier.off_axis_threshold,
        );
        attention.debounce.away_threshold = env_parse(
            &var,
            "VIGIL_AWAY_THRESHOLD",
            attention.debounce.away_threshold,
        );
        if let Some(width) = var("VIGIL_MIN_FACE_WIDTH").and_then(|v| v.parse().ok()) {
            attention.classifier.min_face_width = Some(width);
        }
        if let Some(mode) = var("VIGIL_SCORING_MODE") {
            attention.risk.mode = match mode.as_str() {
                "cumulative" => ScoringMode::Cumulative,
                "last_weight" => ScoringMode::LastWeight,
                other => anyhow::bail!(
                    "VIGIL_SCORING_MODE must be 'last_weight' or 'cumulative', got '{other}'"
                ),
            };
        }
        attention
            .validate()
            .context("invalid attention configuration")?;

        Ok(Self {
            attention,
            replay_path: var("VIGIL_REPLAY_PATH")
                .map(PathBuf::from)
                .or(file.replay_path),
            replay_loop: env_flag(&var, "VIGIL_REPLAY_LOOP", file.replay_loop.unwrap_or(false)),
            tick_interval_ms: env_parse(
                &var,
                "VIGIL_TICK_INTERVAL_MS",
                file.tick_interval_ms.unwrap_or(33),
            )
            .max(1),
            autostart: env_flag(&var, "VIGIL_AUTOSTART", file.autostart.unwrap_or(false)),
            session_bus: var("VIGIL_SESSION_BUS").is_some(),
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let file: FileConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "config file loaded");
    Ok(file)
}

fn env_parse<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_flag(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    var(key).map(|v| v != "0").unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::load(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = load_with(&[]).unwrap();
        assert_eq!(cfg.attention, AttentionConfig::default());
        assert_eq!(cfg.tick_interval_ms, 33);
        assert!(cfg.replay_path.is_none());
        assert!(!cfg.replay_loop);
        assert!(!cfg.autostart);
        assert!(!cfg.session_bus);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = load_with(&[
            ("VIGIL_OFF_AXIS_THRESHOLD", "0.2"),
            ("VIGIL_AWAY_THRESHOLD", "8"),
            ("VIGIL_MIN_FACE_WIDTH", "80"),
            ("VIGIL_SCORING_MODE", "cumulative"),
            ("VIGIL_REPLAY_PATH", "/tmp/frames.jsonl"),
            ("VIGIL_REPLAY_LOOP", "1"),
            ("VIGIL_TICK_INTERVAL_MS", "100"),
            ("VIGIL_SESSION_BUS", "1"),
        ])
        .unwrap();
        assert_eq!(cfg.attention.classifier.off_axis_threshold, 0.2);
        assert_eq!(cfg.attention.debounce.away_threshold, 8);
        assert_eq!(cfg.attention.classifier.min_face_width, Some(80.0));
        assert_eq!(cfg.attention.risk.mode, ScoringMode::Cumulative);
        assert_eq!(cfg.replay_path, Some(PathBuf::from("/tmp/frames.jsonl")));
        assert!(cfg.replay_loop);
        assert_eq!(cfg.tick_interval_ms, 100);
        assert!(cfg.session_bus);
    }

    #[test]
    fn test_unparseable_number_falls_back() {
        let cfg = load_with(&[("VIGIL_AWAY_THRESHOLD", "many")]).unwrap();
        assert_eq!(cfg.attention.debounce.away_threshold, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load_with(&[("VIGIL_AWAY_THRESHOLD", "0")]).is_err());
        assert!(load_with(&[("VIGIL_SCORING_MODE", "sometimes")]).is_err());
    }

    #[test]
    fn test_file_layered_under_env() {
        let dir = std::env::temp_dir().join(format!(
            "vigild-config-test-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vigil.toml");
        std::fs::write(
            &path,
            r#"
tick_interval_ms = 50
replay_path = "/srv/recording.jsonl"

[attention.debounce]
away_threshold = 7

[attention.risk]
no_face_weight = 30
"#,
        )
        .unwrap();

        let cfg = load_with(&[
            ("VIGIL_CONFIG", path.to_str().unwrap()),
            ("VIGIL_TICK_INTERVAL_MS", "20"),
        ])
        .unwrap();
        assert_eq!(cfg.tick_interval_ms, 20);
        assert_eq!(cfg.attention.debounce.away_threshold, 7);
        assert_eq!(cfg.attention.risk.no_face_weight, 30);
        assert_eq!(cfg.attention.risk.face_away_weight, 20);
        assert_eq!(cfg.replay_path, Some(PathBuf::from("/srv/recording.jsonl")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load_with(&[("VIGIL_CONFIG", "/nonexistent/vigil.toml")]).is_err());
    }
}
