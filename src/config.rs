use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use midi_to_ticks::notation::DEFAULT_SOURCE_TICKS_PER_BEAT;
use midi_to_ticks::TimingMode;
use tick_core::{TimelineConfig, CANONICAL_TICKS_PER_BEAT, DEFAULT_BPM, DEFAULT_CHORD_TOLERANCE};

/// Settings for one conversion run.
///
/// Loaded from an optional JSON file, then overridden by command-line flags.
/// Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Input file; `-` reads notation from stdin
    pub source: Option<PathBuf>,
    pub timing: TimingMode,
    /// Resolution of the output timeline
    pub target_ticks_per_beat: u32,
    /// Resolution of notation event lists
    pub source_ticks_per_beat: u32,
    /// Tempo used to turn elapsed seconds into ticks in seconds mode
    pub seconds_bpm: f64,
    pub label: String,
    /// Playback tempo written after the label; falls back to the source tempo
    pub tempo_bpm: Option<f64>,
    pub include_tempo: bool,
    /// Semitones added to every pitch
    pub transpose: i32,
    /// Keep only notes starting within this many seconds
    pub window_seconds: Option<f64>,
    /// Keep only the first N chord groups
    pub max_groups: Option<usize>,
    pub chord_tolerance: u64,
    pub drop_zero_duration: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: None,
            timing: TimingMode::Ticks,
            target_ticks_per_beat: CANONICAL_TICKS_PER_BEAT,
            source_ticks_per_beat: DEFAULT_SOURCE_TICKS_PER_BEAT,
            seconds_bpm: DEFAULT_BPM,
            label: "Untitled".to_string(),
            tempo_bpm: None,
            include_tempo: false,
            transpose: 0,
            window_seconds: None,
            max_groups: None,
            chord_tolerance: DEFAULT_CHORD_TOLERANCE,
            drop_zero_duration: true,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn target_timeline(&self) -> TimelineConfig {
        TimelineConfig::new(self.target_ticks_per_beat)
    }

    pub fn source_timeline(&self) -> TimelineConfig {
        TimelineConfig::new(self.source_ticks_per_beat)
    }

    /// Reject settings no conversion can honor
    pub fn validate(&self) -> Result<()> {
        if self.target_ticks_per_beat == 0 || self.source_ticks_per_beat == 0 {
            anyhow::bail!("ticks per beat must be positive");
        }
        if self.seconds_bpm.is_nan() || self.seconds_bpm <= 0.0 {
            anyhow::bail!("seconds_bpm must be positive, got {}", self.seconds_bpm);
        }
        if let Some(bpm) = self.tempo_bpm {
            if bpm.is_nan() || bpm <= 0.0 {
                anyhow::bail!("tempo_bpm must be positive, got {}", bpm);
            }
        }
        if self.label.contains(|c: char| c == ':' || c == ']') {
            tracing::warn!(label = %self.label, "label contains ':' or ']' and will not decode cleanly");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"label": "Blackbird 30sec", "window_seconds": 30.0, "timing": "seconds"}"#)
                .unwrap();
        assert_eq!(config.label, "Blackbird 30sec");
        assert_eq!(config.window_seconds, Some(30.0));
        assert_eq!(config.timing, TimingMode::Seconds);
        assert_eq!(config.target_ticks_per_beat, 480);
        assert_eq!(config.chord_tolerance, 10);
        assert!(config.drop_zero_duration);
    }

    #[test]
    fn test_validate() {
        assert!(RunConfig::default().validate().is_ok());

        let config = RunConfig {
            target_ticks_per_beat: 0,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunConfig {
            tempo_bpm: Some(-5.0),
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/tickscribe.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
