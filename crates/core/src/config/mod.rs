use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, VisemeSyncError};

/// Top-level configuration structure for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub motion: MotionConfig,
    pub crossfade: CrossfadeConfig,
    pub idle: IdleConfig,
    pub timeline: TimelineConfig,
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects values that would make the spring filter or the timeline
    /// degenerate.
    pub fn validate(&self) -> Result<()> {
        let m = &self.motion;
        positive("motion.damping_ratio", m.damping_ratio)?;
        positive("motion.jaw_frequency_hz", m.jaw_frequency_hz)?;
        positive("motion.lip_frequency_hz", m.lip_frequency_hz)?;
        positive("motion.exaggeration", m.exaggeration)?;
        positive("motion.min_dt_ms", m.min_dt_ms)?;
        positive("motion.max_dt_ms", m.max_dt_ms)?;
        if m.min_dt_ms > m.max_dt_ms {
            return Err(VisemeSyncError::InvalidConfig(format!(
                "motion.min_dt_ms ({}) exceeds motion.max_dt_ms ({})",
                m.min_dt_ms, m.max_dt_ms
            )));
        }
        positive("crossfade.window_ms", self.crossfade.window_ms)?;
        positive("idle.decay_rate", self.idle.decay_rate)?;
        let t = &self.timeline;
        positive("timeline.default_fps", t.default_fps)?;
        positive("timeline.default_fps frame step", 1.0 / t.default_fps)?;
        positive("timeline.min_duration_ms", t.min_duration_ms)?;
        positive("timeline.max_duration_ms", t.max_duration_ms)?;
        if t.min_duration_ms > t.max_duration_ms {
            return Err(VisemeSyncError::InvalidConfig(format!(
                "timeline.min_duration_ms ({}) exceeds timeline.max_duration_ms ({})",
                t.min_duration_ms, t.max_duration_ms
            )));
        }
        non_negative(
            "timeline.completion_grace_ms",
            self.timeline.completion_grace_ms,
        )?;
        Ok(())
    }
}

/// Spring filter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// When disabled the target pose is returned unfiltered.
    pub enabled: bool,
    pub damping_ratio: f32,
    /// Natural frequency of the jaw channel (channel 0).
    pub jaw_frequency_hz: f32,
    /// Natural frequency shared by the remaining channels.
    pub lip_frequency_hz: f32,
    pub exaggeration: f32,
    pub min_dt_ms: f32,
    pub max_dt_ms: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            damping_ratio: 0.84,
            jaw_frequency_hz: 6.0,
            lip_frequency_hz: 4.5,
            exaggeration: 1.04,
            min_dt_ms: 1.0,
            max_dt_ms: 33.0,
        }
    }
}

impl MotionConfig {
    /// Filter settings that hand the target pose through untouched.
    pub fn passthrough() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    pub window_ms: f32,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self { window_ms: 85.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Exponential decay rate towards neutral, per second.
    pub decay_rate: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { decay_rate: 1.0 }
    }
}

/// Timeline construction and completion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Frame rate assumed for chunks that carry no timing hint at all.
    pub default_fps: f64,
    /// Floor applied to duration-only chunks.
    pub min_duration_ms: f64,
    /// Ceiling on any chunk's playback duration.
    pub max_duration_ms: f64,
    /// Added to a chunk's duration before the fallback timer completes it.
    pub completion_grace_ms: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_fps: 60.0,
            min_duration_ms: 20.0,
            max_duration_ms: 600_000.0,
            completion_grace_ms: 50.0,
        }
    }
}

fn positive<T: Into<f64> + Copy>(name: &str, value: T) -> Result<()> {
    let value = value.into();
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VisemeSyncError::InvalidConfig(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn non_negative<T: Into<f64> + Copy>(name: &str, value: T) -> Result<()> {
    let value = value.into();
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(VisemeSyncError::InvalidConfig(format!(
            "{name} must be a non-negative finite number, got {value}"
        )))
    }
}
