use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of viseme channels carried by every pose.
pub const CHANNELS: usize = 15;

/// Index of the jaw channel, which the motion filter tunes separately.
pub const JAW: usize = 0;

/// A facial pose: one normalised excitation per viseme channel, each in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; CHANNELS]")]
pub struct Pose([f32; CHANNELS]);

impl Default for Pose {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Pose {
    /// The all-zero resting pose.
    pub const fn neutral() -> Self {
        Self([0.0; CHANNELS])
    }

    /// Builds a pose from raw channel values, clamping each into `[0, 1]`.
    pub fn new(channels: [f32; CHANNELS]) -> Self {
        Self(channels.map(clamp01))
    }

    /// Builds a pose from a transport row. Only the first [`CHANNELS`]
    /// entries are honoured; missing channels read as zero.
    pub fn from_row(row: &[f32]) -> Self {
        let mut channels = [0.0; CHANNELS];
        for (slot, value) in channels.iter_mut().zip(row) {
            *slot = clamp01(*value);
        }
        Self(channels)
    }

    pub fn channels(&self) -> &[f32; CHANNELS] {
        &self.0
    }

    pub fn into_channels(self) -> [f32; CHANNELS] {
        self.0
    }

    pub fn channel(&self, index: usize) -> f32 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    /// Linear blend towards `other`; `factor` is clamped into `[0, 1]`.
    pub fn lerp(&self, other: &Pose, factor: f32) -> Pose {
        let f = clamp01(factor);
        let mut out = [0.0; CHANNELS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i] + (other.0[i] - self.0[i]) * f;
        }
        Pose::new(out)
    }

    /// Largest per-channel absolute difference.
    pub fn max_distance(&self, other: &Pose) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }

    /// Largest channel magnitude.
    pub fn peak(&self) -> f32 {
        self.0.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

impl From<[f32; CHANNELS]> for Pose {
    fn from(value: [f32; CHANNELS]) -> Self {
        Self::new(value)
    }
}

/// Clamps into `[0, 1]`, mapping non-finite input to zero.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Coerces one loosely typed transport sample into a float. Numbers pass
/// through, numeric strings are parsed, booleans map to 0/1 and anything
/// else reads as zero. The result is not clamped.
pub fn coerce_sample(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32).unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f32>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}
