//! Per-chunk time axis construction.
//!
//! A chunk arrives with whatever timing hints the transport could provide.
//! [`TimelineSource::resolve`] picks exactly one of them, in a fixed priority
//! order, and [`TimelineSource::raw_times`] turns it into a monotonic axis
//! starting at zero. Once the true audio duration is known the axis is
//! rescaled in place by [`Timeline::rescale`].

use serde::{Deserialize, Serialize};

use crate::config::TimelineConfig;

/// Timing hints exactly as the transport delivered them. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingHints {
    /// Explicit per-frame timestamps, in seconds. Non-numeric entries are
    /// carried as NaN and repaired during timeline construction.
    #[serde(
        default,
        deserialize_with = "deserialize_times",
        skip_serializing_if = "Option::is_none"
    )]
    pub times: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_interval_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

/// The single timing hint a chunk's axis is derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineSource {
    ExplicitTimes { times: Vec<f64> },
    FixedInterval { interval_ms: f64 },
    FixedRate { fps: f64 },
    TotalDuration { duration_ms: f64 },
}

impl TimelineSource {
    /// Picks the highest priority usable hint. Chunks without any usable
    /// hint are assumed to run at the configured default frame rate.
    pub fn resolve(hints: &TimingHints, config: &TimelineConfig) -> Self {
        if let Some(times) = hints.times.as_ref().filter(|times| times.len() >= 2) {
            return Self::ExplicitTimes {
                times: times.clone(),
            };
        }
        // A rate hint only counts when its frame step is positive and finite.
        if let Some(interval_ms) = hints
            .frame_interval_ms
            .filter(|v| is_positive(*v) && is_positive(v / 1000.0))
        {
            return Self::FixedInterval { interval_ms };
        }
        if let Some(fps) = hints.fps.filter(|v| is_positive(*v) && is_positive(1.0 / v)) {
            return Self::FixedRate { fps };
        }
        if let Some(duration_ms) = hints.duration_ms.filter(|v| v.is_finite()) {
            return Self::TotalDuration {
                duration_ms: duration_ms.clamp(config.min_duration_ms, config.max_duration_ms),
            };
        }
        Self::FixedRate {
            fps: config.default_fps,
        }
    }

    /// Builds the raw axis (seconds) for `frames` samples.
    pub fn raw_times(&self, frames: usize) -> Vec<f64> {
        match self {
            Self::ExplicitTimes { times } => sanitize_explicit(times, frames),
            Self::FixedInterval { interval_ms } => evenly_stepped(frames, interval_ms / 1000.0),
            Self::FixedRate { fps } => evenly_stepped(frames, 1.0 / fps),
            Self::TotalDuration { duration_ms } => {
                let total = duration_ms / 1000.0;
                if frames < 2 {
                    vec![0.0; frames]
                } else {
                    let last = (frames - 1) as f64;
                    (0..frames).map(|i| total * i as f64 / last).collect()
                }
            }
        }
    }

    /// Duration a chunk is held for when its raw axis has no extent, such
    /// as a single-frame chunk.
    fn held_duration(&self, hints: &TimingHints, config: &TimelineConfig) -> f64 {
        let floor = config.min_duration_ms / 1000.0;
        if let Some(duration_ms) = hints.duration_ms.filter(|v| is_positive(*v)) {
            return (duration_ms / 1000.0).max(floor);
        }
        let step = match self {
            Self::FixedInterval { interval_ms } => interval_ms / 1000.0,
            Self::FixedRate { fps } => 1.0 / fps,
            Self::TotalDuration { duration_ms } => duration_ms / 1000.0,
            Self::ExplicitTimes { .. } => floor,
        };
        step.max(floor)
    }
}

/// Raw and playback time axes of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    source: TimelineSource,
    raw: Vec<f64>,
    times: Vec<f64>,
    duration: f64,
    max_duration: f64,
    media_duration: Option<f64>,
}

impl Timeline {
    /// Resolves the hints into an axis. An axis that overflows to infinity
    /// is rebuilt at the default frame rate, and the duration never exceeds
    /// `max_duration_ms`.
    pub fn build(frames: usize, hints: &TimingHints, config: &TimelineConfig) -> Self {
        let mut source = TimelineSource::resolve(hints, config);
        let mut raw = source.raw_times(frames);
        if raw.iter().any(|t| !t.is_finite()) {
            tracing::warn!(?source, frames, "time axis overflows; using the default frame rate");
            source = TimelineSource::FixedRate {
                fps: config.default_fps,
            };
            raw = source.raw_times(frames);
        }

        let tail = raw.last().copied().unwrap_or(0.0);
        let duration = if tail > 0.0 {
            tail
        } else {
            source.held_duration(hints, config)
        };
        let max_duration = config.max_duration_ms / 1000.0;
        if duration > max_duration {
            tracing::warn!(duration, max_duration, "chunk duration capped");
        }

        Self {
            source,
            times: raw.clone(),
            raw,
            duration: duration.min(max_duration),
            max_duration,
            media_duration: None,
        }
    }

    pub fn source(&self) -> &TimelineSource {
        &self.source
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Axis used for sampling: the raw axis, rescaled once the media
    /// duration is known.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Total playback duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn media_duration(&self) -> Option<f64> {
        self.media_duration
    }

    /// Stretches the raw axis to the true media duration. The first valid
    /// duration wins; later reports are ignored. Returns whether the axis
    /// changed.
    pub fn rescale(&mut self, true_duration: f64) -> bool {
        if self.media_duration.is_some() || !is_positive(true_duration) {
            return false;
        }

        let tail = self.raw.last().copied().unwrap_or(0.0);
        let scale = if tail > 0.0 { true_duration / tail } else { 1.0 };
        self.times = self.raw.iter().map(|t| t * scale).collect();
        let scaled_tail = self.times.last().copied().unwrap_or(0.0);
        let duration = if scaled_tail > 0.0 {
            scaled_tail
        } else {
            true_duration
        };
        self.duration = duration.min(self.max_duration);
        self.media_duration = Some(true_duration);
        true
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn evenly_stepped(frames: usize, step: f64) -> Vec<f64> {
    (0..frames).map(|i| i as f64 * step).collect()
}

/// Repairs transport timestamps: non-finite entries repeat the previous
/// value, every entry is floored at zero and at its predecessor, and the
/// axis is shifted to start at zero. A list shorter than the frame count is
/// extended with its mean step; a longer one is truncated.
fn sanitize_explicit(times: &[f64], frames: usize) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(frames);
    let mut previous = 0.0_f64;
    for value in times.iter().take(frames) {
        let value = if value.is_finite() { *value } else { previous };
        let value = value.max(previous).max(0.0);
        out.push(value);
        previous = value;
    }

    if let Some(origin) = out.first().copied() {
        for value in &mut out {
            *value -= origin;
        }
    }

    if out.len() < frames {
        tracing::debug!(
            provided = out.len(),
            frames,
            "extending short timestamp list"
        );
        let step = match out.len() {
            0 | 1 => 0.0,
            n => out[n - 1] / (n - 1) as f64,
        };
        while out.len() < frames {
            let next = out.last().copied().unwrap_or(0.0) + step;
            out.push(next);
        }
    }

    out
}

fn deserialize_times<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .iter()
            .map(|value| match value {
                serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
                _ => f64::NAN,
            })
            .collect()
    }))
}
